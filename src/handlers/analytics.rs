use axum::{
    extract::{Extension, State},
    response::Json,
};

use crate::{
    middleware::auth::AuthUser,
    services::analytics::{AnalyticsService, UserDashboard},
    utils::errors::AppError,
    AppState,
};

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserDashboard>, AppError> {
    let analytics_service = AnalyticsService::new(state.store.clone());
    Ok(Json(analytics_service.get_user_dashboard(auth_user.user_id).await?))
}
