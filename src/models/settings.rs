use serde::{Deserialize, Serialize};

/// Site-wide identity and contact details shown in the header and footer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneralSettings {
    pub school_name: String,
    pub page_title: String,
    pub logo_url: String,
    pub hotline: String,
    pub email: String,
    pub address: String,
    /// Dashboard counters maintained by hand.
    pub total_students: u32,
    pub visit_count: u64,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            school_name: "Trường Mẫu Giáo Vàng Anh".into(),
            page_title: "Trường Mẫu Giáo Vàng Anh - Ươm mầm hạnh phúc".into(),
            logo_url: String::new(),
            hotline: "090 123 4567".into(),
            email: "info@vanganh.edu.vn".into(),
            address: "123 Đường Hạnh Phúc, Quận 1, TP.HCM".into(),
            total_students: 0,
            visit_count: 0,
        }
    }
}
