use axum::{
    extract::{Extension, Path, State},
    response::Json,
};
use uuid::Uuid;

use crate::{
    middleware::auth::AuthUser,
    models::user::UserResponse,
    services::analytics::{AnalyticsService, PlatformDashboard, PlatformInsights, UserDetail},
    utils::errors::AppError,
    AppState,
};

pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<PlatformDashboard>, AppError> {
    auth_user.require_admin("/api/admin/dashboard")?;

    let analytics_service = AnalyticsService::new(state.store.clone());
    Ok(Json(analytics_service.get_platform_dashboard().await?))
}

pub async fn get_users(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<Vec<UserResponse>>, AppError> {
    auth_user.require_admin("/api/admin/users")?;

    let analytics_service = AnalyticsService::new(state.store.clone());
    Ok(Json(analytics_service.list_candidates().await?))
}

pub async fn get_user_detail(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserDetail>, AppError> {
    auth_user.require_admin("/api/admin/users/:id")?;

    let analytics_service = AnalyticsService::new(state.store.clone());
    Ok(Json(analytics_service.get_user_detail(user_id).await?))
}

pub async fn get_insights(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<PlatformInsights>, AppError> {
    auth_user.require_admin("/api/admin/insights")?;

    let analytics_service = AnalyticsService::new(state.store.clone());
    Ok(Json(analytics_service.get_platform_insights().await?))
}
