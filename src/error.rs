use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::store::StoreError;

/// Failures of the menu feature, one variant per user-visible outcome.
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    /// The month-scoped fetch failed; callers must not fall back to stale data.
    #[error("failed to load menus: {0}")]
    QueryFailure(#[source] StoreError),
    /// A week batch was refused; nothing was written.
    #[error("failed to save menus: {0}")]
    PersistenceError(#[source] StoreError),
    /// Upload, link or unlink of the monthly menu file failed.
    #[error("monthly menu file operation failed: {0}")]
    AttachmentError(String),
    #[error("{0}")]
    Validation(String),
}

/// Errors returned by HTTP handlers, rendered as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Menu(#[from] MenuError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("upload failed: {0}")]
    Upload(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Menu(MenuError::Validation(_)) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Menu(MenuError::QueryFailure(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Menu(_) | AppError::Store(_) | AppError::Upload(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("{self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
