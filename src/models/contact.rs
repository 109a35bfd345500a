use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Processed,
}

impl LeadStatus {
    pub fn toggled(self) -> Self {
        match self {
            LeadStatus::New => LeadStatus::Processed,
            LeadStatus::Processed => LeadStatus::New,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            LeadStatus::New => "Mới",
            LeadStatus::Processed => "Đã xử lý",
        }
    }
}

/// A consultation request left through the public contact form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactLead {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub parent_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub child_name: String,
    #[serde(default)]
    pub child_age: String,
    #[serde(default)]
    pub message: String,
    pub status: LeadStatus,
    /// `DD/MM/YYYY`, for display.
    pub date: String,
    pub created_at: DateTime<Utc>,
}

/// Body for POST /contacts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContactRequest {
    pub parent_name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub child_name: String,
    #[serde(default)]
    pub child_age: String,
    #[serde(default)]
    pub message: String,
}

/// Body for POST /admin/contacts/{id}/status. Omitting `status` toggles it.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<LeadStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContactStats {
    pub total: usize,
    pub new: usize,
    pub processed: usize,
}
