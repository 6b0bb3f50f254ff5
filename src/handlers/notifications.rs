use axum::{
    extract::{Extension, Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    middleware::auth::AuthUser, services::notification::NotificationService, utils::errors::AppError, AppState,
};

#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    pub days: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub message: String,
    pub processed_users: usize,
    pub total_stale_sessions: usize,
}

pub async fn trigger_notifications(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<NotificationResponse>, AppError> {
    auth_user.require_admin("/api/admin/notifications/trigger")?;

    let days = query.days.unwrap_or(state.stale_session_days);
    if days < 0 {
        return Err(AppError::BadRequest("days must not be negative".to_string()));
    }

    let notification_service = NotificationService::new(state.store.clone());
    let report = notification_service.process_stale_sessions(days).await.map_err(|e| {
        tracing::error!("Failed to process reminders: {}", e);
        AppError::InternalServerError("Failed to process reminders".to_string())
    })?;

    Ok(Json(NotificationResponse {
        message: format!("Reminders processed for sessions older than {} days", days),
        processed_users: report.processed_users,
        total_stale_sessions: report.total_stale_sessions,
    }))
}
