use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    app::AppState,
    error::AppError,
    middleware::rate_limit::{check_rate_limit, ClientIp},
    models::{
        auth::AuthenticatedStaff,
        contact::{ContactLead, ContactStats, NewContactRequest, UpdateStatusRequest},
    },
    services::contacts::ContactService,
};

/// POST /contacts: public contact form, rate limited per client IP
pub async fn submit_contact(
    State(state): State<AppState>,
    ClientIp(ip): ClientIp,
    Json(payload): Json<NewContactRequest>,
) -> Response {
    match (state.redis.clone(), ip) {
        (Some(mut redis), Some(ip)) => {
            let rate_limit_key = format!("contact:form:{}", ip);
            if let Err(rejection) = check_rate_limit(
                &mut redis,
                &rate_limit_key,
                state.config.contact_rate_limit,
                3600,
            )
            .await
            {
                return rejection.into_response();
            }
        }
        (Some(_), None) => {
            tracing::warn!("Contact form request without a client address, not rate limited");
        }
        (None, _) => {}
    }

    match ContactService::submit(state.store.as_ref(), payload).await {
        Ok(lead) => (
            StatusCode::CREATED,
            Json(json!({
                "id": lead.id,
                "message": "Gửi thông tin thành công! Nhà trường sẽ liên hệ sớm nhất.",
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// GET /admin/contacts: newest first
pub async fn list_contacts(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
) -> Result<Json<Vec<ContactLead>>, AppError> {
    let leads = ContactService::list(state.store.as_ref()).await?;
    Ok(Json(leads))
}

/// GET /admin/contacts/stats
pub async fn contact_stats(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
) -> Result<Json<ContactStats>, AppError> {
    let stats = ContactService::stats(state.store.as_ref()).await?;
    Ok(Json(stats))
}

/// POST /admin/contacts/{id}/status: sets or toggles new/processed
pub async fn update_status(
    State(state): State<AppState>,
    _staff: AuthenticatedStaff,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<ContactLead>, AppError> {
    let lead = ContactService::update_status(state.store.as_ref(), &id, body.status).await?;
    Ok(Json(lead))
}

/// DELETE /admin/contacts/{id}: admins only
pub async fn delete_contact(
    State(state): State<AppState>,
    staff: AuthenticatedStaff,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    if !staff.is_admin() {
        return Err(AppError::Forbidden("Không có quyền thực hiện".into()));
    }
    ContactService::delete(state.store.as_ref(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
