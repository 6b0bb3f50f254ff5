use crate::{
    models::user::UserRole,
    utils::{errors::AppError, jwt::verify_jwt, logger::LOGGER},
    AppState,
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde_json::json;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        matches!(self.role, UserRole::Admin)
    }

    /// Admin gate for handlers; refusals are logged as business events.
    pub fn require_admin(&self, path: &str) -> Result<(), AppError> {
        if self.is_admin() {
            return Ok(());
        }

        LOGGER.log_business_event(
            "unauthorized_admin_access",
            Some(self.user_id),
            [("path".to_string(), json!(path))].iter().cloned().collect(),
        );
        Err(AppError::Forbidden("Admin access required".to_string()))
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = verify_jwt(token, &state.jwt_secret).map_err(|_| StatusCode::UNAUTHORIZED)?;
    let role = UserRole::parse(&claims.role).ok_or(StatusCode::UNAUTHORIZED)?;

    let auth_user = AuthUser {
        user_id: claims.sub,
        role,
    };

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    request.extensions_mut().insert(auth_user.clone());

    let response = next.run(request).await;
    LOGGER.log_request(method.as_str(), &path, Some(auth_user.user_id), response.status().as_u16());
    Ok(response)
}
