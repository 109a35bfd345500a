use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_NEWS_TAG: &str = "Hoạt động";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsStatus {
    /// Shown on the public news page.
    #[default]
    Active,
    Hidden,
}

/// A news or activity article.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    /// Rich-text HTML from the editor.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tag: String,
    /// `DD/MM/YYYY`, for display.
    #[serde(default)]
    pub date: String,
    /// Cover image URL.
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub status: NewsStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl NewsArticle {
    pub fn is_published(&self) -> bool {
        self.status == NewsStatus::Active
    }

    /// Case-insensitive match on title or summary.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.title.to_lowercase().contains(&term)
            || self.summary.to_lowercase().contains(&term)
    }
}

/// Body for POST /admin/news and PUT /admin/news/{id}.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsInput {
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub status: NewsStatus,
}

/// Query params for GET /news.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewsQuery {
    pub tag: Option<String>,
    pub q: Option<String>,
}
