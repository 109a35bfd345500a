use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    app::AppState,
    error::AppError,
    models::{
        auth::AuthenticatedStaff,
        news::{NewsArticle, NewsInput, NewsQuery},
    },
    routes::upload::image_upload_response,
    services::news::NewsService,
};

/// GET /news?tag=&q=: published articles, newest first
pub async fn list_published(
    State(state): State<AppState>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<Vec<NewsArticle>>, AppError> {
    let articles = NewsService::list_published(state.store.as_ref(), &query).await?;
    Ok(Json(articles))
}

/// GET /news/{id}
pub async fn get_published(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<NewsArticle>, AppError> {
    Ok(Json(NewsService::get_published(state.store.as_ref(), &id).await?))
}

/// GET /admin/news: drafts included
pub async fn list_all(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
) -> Result<Json<Vec<NewsArticle>>, AppError> {
    Ok(Json(NewsService::list_all(state.store.as_ref()).await?))
}

pub async fn create(
    State(state): State<AppState>,
    staff: AuthenticatedStaff,
    Json(body): Json<NewsInput>,
) -> Result<(StatusCode, Json<NewsArticle>), AppError> {
    let article = NewsService::create(state.store.as_ref(), body).await?;
    tracing::info!("News article {} created by {}", article.id, staff.user_id);
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn update(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    Path(id): Path<String>,
    Json(body): Json<NewsInput>,
) -> Result<Json<NewsArticle>, AppError> {
    Ok(Json(NewsService::update(state.store.as_ref(), &id, body).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    NewsService::delete(state.store.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/news/cover: multipart `file`
pub async fn upload_cover(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    image_upload_response(state.blobs.as_ref(), "news/covers", multipart).await
}

/// POST /admin/news/images: images pasted into the article editor
pub async fn upload_content_image(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    image_upload_response(state.blobs.as_ref(), "news/content", multipart).await
}
