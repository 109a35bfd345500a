use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

use crate::{
    app::AppState,
    error::AppError,
    models::{
        announcement::{Announcement, AnnouncementInput},
        auth::AuthenticatedStaff,
    },
    routes::upload::image_upload_response,
    services::announcements::AnnouncementService,
};

/// GET /announcements: active only
pub async fn list_published(
    State(state): State<AppState>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    Ok(Json(
        AnnouncementService::list_published(state.store.as_ref()).await?,
    ))
}

/// GET /announcements/{id}
pub async fn get_published(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Announcement>, AppError> {
    Ok(Json(
        AnnouncementService::get_published(state.store.as_ref(), &id).await?,
    ))
}

/// GET /admin/announcements
pub async fn list_all(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
) -> Result<Json<Vec<Announcement>>, AppError> {
    Ok(Json(AnnouncementService::list_all(state.store.as_ref()).await?))
}

pub async fn create(
    State(state): State<AppState>,
    staff: AuthenticatedStaff,
    Json(body): Json<AnnouncementInput>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    let item = AnnouncementService::create(state.store.as_ref(), body).await?;
    tracing::info!("Announcement {} created by {}", item.id, staff.user_id);
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    Path(id): Path<String>,
    Json(body): Json<AnnouncementInput>,
) -> Result<Json<Announcement>, AppError> {
    Ok(Json(
        AnnouncementService::update(state.store.as_ref(), &id, body).await?,
    ))
}

pub async fn delete(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    AnnouncementService::delete(state.store.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/announcements/images: images pasted into the editor
pub async fn upload_image(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    image_upload_response(state.blobs.as_ref(), "announcements/images", multipart).await
}
