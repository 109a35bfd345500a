use axum::{extract::Multipart, http::StatusCode, Json};
use bytes::Bytes;
use serde_json::{json, Value};

use crate::{
    error::AppError,
    services::blob::{upload_image, BlobError, BlobStore},
};

/// First `file` field of a multipart form: (client file name, bytes).
pub async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        return Ok((file_name, bytes));
    }
    Err(AppError::BadRequest("Vui lòng chọn file".into()))
}

/// Uploads the form's image under `dir` and answers `201 {"url": ...}`.
pub async fn image_upload_response(
    blobs: &dyn BlobStore,
    dir: &str,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let (file_name, bytes) = read_file_field(&mut multipart).await?;
    let url = upload_image(blobs, dir, &file_name, bytes)
        .await
        .map_err(|e| match e {
            BlobError::Empty => AppError::BadRequest("Vui lòng chọn file".into()),
            other => AppError::Upload(other.to_string()),
        })?;
    Ok((StatusCode::CREATED, Json(json!({ "url": url }))))
}
