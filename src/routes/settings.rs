use axum::{extract::State, Json};

use crate::{
    app::AppState,
    error::AppError,
    models::{auth::AuthenticatedStaff, settings::GeneralSettings},
    services::settings::SettingsService,
};

/// GET /settings/general: public, defaults until first saved
pub async fn get_general(
    State(state): State<AppState>,
) -> Result<Json<GeneralSettings>, AppError> {
    Ok(Json(SettingsService::get(state.store.as_ref()).await?))
}

/// PUT /admin/settings/general: replaces the whole document
pub async fn update_general(
    State(state): State<AppState>,
    staff: AuthenticatedStaff,
    Json(body): Json<GeneralSettings>,
) -> Result<Json<GeneralSettings>, AppError> {
    if !staff.is_admin() {
        return Err(AppError::Forbidden("Không có quyền thực hiện".into()));
    }
    Ok(Json(SettingsService::update(state.store.as_ref(), body).await?))
}
