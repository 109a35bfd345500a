use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ANNOUNCEMENT_TAG: &str = "Quan trọng";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnouncementStatus {
    #[default]
    Active,
    /// Kept for the record, greyed out in the panel and hidden from parents.
    Expired,
    Hidden,
}

/// A notice for parents (closures, health checks, events).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tag: String,
    #[serde(default)]
    pub status: AnnouncementStatus,
    /// `DD/MM/YYYY` of the first publication.
    #[serde(default)]
    pub date: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Announcement {
    pub fn is_published(&self) -> bool {
        self.status == AnnouncementStatus::Active
    }
}

/// Body for POST /admin/announcements and PUT /admin/announcements/{id}.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementInput {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub status: AnnouncementStatus,
}
