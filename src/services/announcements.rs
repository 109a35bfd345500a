use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::announcement::{Announcement, AnnouncementInput, DEFAULT_ANNOUNCEMENT_TAG},
    store::{decode_all, document_body, DocumentStore, StoreError, Subscription},
};

pub const ANNOUNCEMENTS: &str = "announcements";

pub struct AnnouncementService;

impl AnnouncementService {
    /// All announcements, newest first.
    pub async fn list_all(store: &dyn DocumentStore) -> Result<Vec<Announcement>, StoreError> {
        let docs = store.list(ANNOUNCEMENTS).await?;
        let mut items: Vec<Announcement> = decode_all(ANNOUNCEMENTS, docs);
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(items)
    }

    /// Active announcements for parents, newest first.
    pub async fn list_published(store: &dyn DocumentStore) -> Result<Vec<Announcement>, StoreError> {
        let items = Self::list_all(store).await?;
        Ok(items.into_iter().filter(Announcement::is_published).collect())
    }

    pub async fn get_published(
        store: &dyn DocumentStore,
        id: &str,
    ) -> Result<Announcement, AppError> {
        let item = Self::get(store, id).await?;
        if !item.is_published() {
            return Err(not_found());
        }
        Ok(item)
    }

    pub async fn create(
        store: &dyn DocumentStore,
        input: AnnouncementInput,
    ) -> Result<Announcement, AppError> {
        let now = Utc::now();
        let item = Announcement {
            id: Uuid::new_v4().to_string(),
            title: validated_title(&input.title)?,
            summary: input.summary.trim().to_string(),
            content: input.content,
            tag: tag_or_default(input.tag),
            status: input.status,
            date: now.format("%d/%m/%Y").to_string(),
            created_at: now,
            updated_at: None,
        };
        store
            .set(ANNOUNCEMENTS, &item.id, to_data(&item)?)
            .await?;
        tracing::info!("Created announcement {}", item.id);
        Ok(item)
    }

    pub async fn update(
        store: &dyn DocumentStore,
        id: &str,
        input: AnnouncementInput,
    ) -> Result<Announcement, AppError> {
        let current = Self::get(store, id).await?;
        let item = Announcement {
            title: validated_title(&input.title)?,
            summary: input.summary.trim().to_string(),
            content: input.content,
            tag: tag_or_default(input.tag),
            status: input.status,
            updated_at: Some(Utc::now()),
            ..current
        };
        store
            .set(ANNOUNCEMENTS, &item.id, to_data(&item)?)
            .await?;
        tracing::info!("Updated announcement {}", item.id);
        Ok(item)
    }

    pub async fn delete(store: &dyn DocumentStore, id: &str) -> Result<(), AppError> {
        if store.get(ANNOUNCEMENTS, id).await?.is_none() {
            return Err(not_found());
        }
        store.delete(ANNOUNCEMENTS, id).await?;
        tracing::info!("Deleted announcement {}", id);
        Ok(())
    }

    pub fn subscribe(store: &dyn DocumentStore) -> Subscription {
        store.subscribe(ANNOUNCEMENTS)
    }

    async fn get(store: &dyn DocumentStore, id: &str) -> Result<Announcement, AppError> {
        let doc = store
            .get(ANNOUNCEMENTS, id)
            .await?
            .ok_or_else(not_found)?;
        doc.decode()
            .map_err(|e| AppError::BadRequest(format!("Thông báo không hợp lệ: {e}")))
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Không tìm thấy thông báo".into())
}

fn validated_title(title: &str) -> Result<String, AppError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::BadRequest("Vui lòng nhập tiêu đề".into()));
    }
    Ok(title.to_string())
}

fn tag_or_default(tag: Option<String>) -> String {
    tag.map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_ANNOUNCEMENT_TAG.to_string())
}

fn to_data(item: &Announcement) -> Result<serde_json::Value, AppError> {
    document_body(item).map_err(|e| AppError::BadRequest(e.to_string()))
}
