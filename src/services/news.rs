use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::news::{NewsArticle, NewsInput, NewsQuery, DEFAULT_NEWS_TAG},
    store::{decode_all, document_body, DocumentStore, StoreError, Subscription},
};

pub const NEWS: &str = "news";

pub struct NewsService;

impl NewsService {
    /// Every article, drafts included, newest first.
    pub async fn list_all(store: &dyn DocumentStore) -> Result<Vec<NewsArticle>, StoreError> {
        let docs = store.list(NEWS).await?;
        let mut articles: Vec<NewsArticle> = decode_all(NEWS, docs);
        articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(articles)
    }

    /// Published articles for the public page, optionally narrowed by tag and search term.
    pub async fn list_published(
        store: &dyn DocumentStore,
        query: &NewsQuery,
    ) -> Result<Vec<NewsArticle>, StoreError> {
        let articles = Self::list_all(store).await?;
        Ok(articles
            .into_iter()
            .filter(NewsArticle::is_published)
            .filter(|a| query.tag.as_deref().map_or(true, |tag| a.tag == tag))
            .filter(|a| query.q.as_deref().map_or(true, |q| a.matches_search(q)))
            .collect())
    }

    /// A published article. Hidden ones are reported as missing.
    pub async fn get_published(store: &dyn DocumentStore, id: &str) -> Result<NewsArticle, AppError> {
        let article = Self::get(store, id).await?;
        if !article.is_published() {
            return Err(not_found());
        }
        Ok(article)
    }

    pub async fn create(store: &dyn DocumentStore, input: NewsInput) -> Result<NewsArticle, AppError> {
        let title = validated_title(&input.title)?;
        let now = Utc::now();
        let article = NewsArticle {
            id: Uuid::new_v4().to_string(),
            title,
            summary: input.summary.trim().to_string(),
            content: input.content,
            tag: tag_or_default(input.tag),
            date: input
                .date
                .filter(|d| !d.trim().is_empty())
                .unwrap_or_else(|| now.format("%d/%m/%Y").to_string()),
            image: input.image.trim().to_string(),
            status: input.status,
            created_at: now,
            updated_at: None,
        };
        store.set(NEWS, &article.id, to_data(&article)?).await?;
        tracing::info!("Created news article {}", article.id);
        Ok(article)
    }

    /// Replaces the editable fields; `createdAt` is kept.
    pub async fn update(
        store: &dyn DocumentStore,
        id: &str,
        input: NewsInput,
    ) -> Result<NewsArticle, AppError> {
        let current = Self::get(store, id).await?;
        let article = NewsArticle {
            title: validated_title(&input.title)?,
            summary: input.summary.trim().to_string(),
            content: input.content,
            tag: tag_or_default(input.tag),
            date: input
                .date
                .filter(|d| !d.trim().is_empty())
                .unwrap_or(current.date.clone()),
            image: input.image.trim().to_string(),
            status: input.status,
            updated_at: Some(Utc::now()),
            ..current
        };
        store.set(NEWS, &article.id, to_data(&article)?).await?;
        tracing::info!("Updated news article {}", article.id);
        Ok(article)
    }

    pub async fn delete(store: &dyn DocumentStore, id: &str) -> Result<(), AppError> {
        if store.get(NEWS, id).await?.is_none() {
            return Err(not_found());
        }
        store.delete(NEWS, id).await?;
        tracing::info!("Deleted news article {}", id);
        Ok(())
    }

    pub fn subscribe(store: &dyn DocumentStore) -> Subscription {
        store.subscribe(NEWS)
    }

    async fn get(store: &dyn DocumentStore, id: &str) -> Result<NewsArticle, AppError> {
        let doc = store.get(NEWS, id).await?.ok_or_else(not_found)?;
        doc.decode()
            .map_err(|e| AppError::BadRequest(format!("Bài viết không hợp lệ: {e}")))
    }
}

fn not_found() -> AppError {
    AppError::NotFound("Không tìm thấy bài viết".into())
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
        .unwrap_or_else(|| DEFAULT_NEWS_TAG.to_string())
}

fn to_data(article: &NewsArticle) -> Result<serde_json::Value, AppError> {
    document_body(article).map_err(|e| AppError::BadRequest(e.to_string()))
}
