use serde::{Deserialize, Serialize};

/// One row of the daily timetable, e.g. `07:00 - 08:00` / `Đón trẻ`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleItem {
    /// Display order; also the document id.
    pub id: u32,
    pub time: String,
    pub activity: String,
}

/// Body for PUT /admin/schedule.
#[derive(Debug, Deserialize)]
pub struct ReplaceScheduleRequest {
    pub items: Vec<ScheduleItem>,
}
