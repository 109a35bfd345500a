use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use chrono::Local;
use serde_json::{json, Value};

use crate::{
    app::AppState,
    error::{AppError, MenuError},
    models::{
        auth::AuthenticatedStaff,
        menu::{CurrentMenuQuery, MonthQuery, MonthlyMenuAttachment, SaveWeekRequest},
    },
    services::menu_view::{editing_view, public_view, EditingView, Notice, PublicMenuView},
};

/// GET /menus/current?week=N: public, current calendar month only
pub async fn get_current(
    State(state): State<AppState>,
    Query(params): Query<CurrentMenuQuery>,
) -> Json<PublicMenuView> {
    let today = Local::now().date_naive();
    Json(public_view(&state.menus, today, params.week).await)
}

/// GET /admin/menus?year=YYYY&month=M: all four week tabs of a month
pub async fn get_month(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    Query(params): Query<MonthQuery>,
) -> Result<Json<EditingView>, AppError> {
    let view = editing_view(&state.menus, params.year, params.month).await?;
    Ok(Json(view))
}

/// PUT /admin/menus/week: saves one week tab
pub async fn save_week(
    State(state): State<AppState>,
    staff: AuthenticatedStaff,
    Json(body): Json<SaveWeekRequest>,
) -> Result<Json<Value>, AppError> {
    let (year, month, week) = (body.year, body.month, body.week);
    let records = body.into_records();
    let saved = state.menus.save_week(year, month, week, &records).await?;
    tracing::info!(
        "Menu week {} of {}/{} saved by {}",
        week,
        month,
        year,
        staff.user_id
    );

    let notice = Notice::success(format!(
        "Đã lưu thực đơn tuần {week} (Tháng {month}) thành công!"
    ));
    Ok(Json(json!({ "days": saved, "notice": notice })))
}

/// GET /admin/menus/attachment?year=YYYY&month=M
pub async fn get_attachment(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    Query(params): Query<MonthQuery>,
) -> Result<Json<Option<MonthlyMenuAttachment>>, AppError> {
    let attachment = state
        .menus
        .get_attachment(params.year, params.month)
        .await?;
    Ok(Json(attachment))
}

/// POST /admin/menus/attachment: multipart with `year`, `month` and `file`
pub async fn upload_attachment(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MonthlyMenuAttachment>), AppError> {
    let mut year: Option<i32> = None;
    let mut month: Option<u32> = None;
    let mut file: Option<(String, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                file = Some((filename, bytes));
            }
            "year" => {
                year = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .trim()
                    .parse()
                    .ok();
            }
            "month" => {
                month = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?
                    .trim()
                    .parse()
                    .ok();
            }
            _ => {}
        }
    }

    let (year, month) = year
        .zip(month)
        .ok_or_else(|| AppError::BadRequest("Thiếu tháng hoặc năm".into()))?;
    let (file_name, bytes) =
        file.ok_or_else(|| MenuError::Validation("Vui lòng chọn file".into()))?;

    let attachment = state
        .menus
        .upload_attachment(state.blobs.as_ref(), year, month, &file_name, bytes)
        .await?;
    Ok((StatusCode::CREATED, Json(attachment)))
}

/// DELETE /admin/menus/attachment?year=YYYY&month=M: unlinks and removes the month's file
pub async fn delete_attachment(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    Query(params): Query<MonthQuery>,
) -> Result<StatusCode, AppError> {
    state
        .menus
        .delete_attachment(state.blobs.as_ref(), params.year, params.month)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
