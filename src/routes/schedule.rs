use axum::{extract::State, Json};

use crate::{
    app::AppState,
    error::AppError,
    models::{
        auth::AuthenticatedStaff,
        schedule::{ReplaceScheduleRequest, ScheduleItem},
    },
    services::schedule::ScheduleService,
};

/// GET /schedule: public
pub async fn get_schedule(
    State(state): State<AppState>,
) -> Result<Json<Vec<ScheduleItem>>, AppError> {
    let items = ScheduleService::list(state.store.as_ref()).await?;
    Ok(Json(items))
}

/// PUT /admin/schedule: replaces every row
pub async fn replace_schedule(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    Json(body): Json<ReplaceScheduleRequest>,
) -> Result<Json<Vec<ScheduleItem>>, AppError> {
    let items = ScheduleService::replace(state.store.as_ref(), body.items).await?;
    Ok(Json(items))
}
