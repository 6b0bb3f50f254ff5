use axum::{
    extract::{Extension, State},
    response::Json,
};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::Utc;
use validator::Validate;

use crate::{
    middleware::auth::AuthUser,
    models::user::{LoginRequest, SignupRequest, TokenResponse, User, UserResponse, UserRole},
    store::{InterviewStore, StoreError},
    utils::{errors::AppError, jwt::create_jwt},
    AppState,
};

fn issue_token(state: &AppState, user: User) -> Result<TokenResponse, AppError> {
    let access_token = create_jwt(
        user.id,
        &user.email,
        user.role.as_str(),
        &state.jwt_secret,
        state.jwt_expiry_minutes,
    )
    .map_err(|_| AppError::InternalServerError("Failed to create token".to_string()))?;

    Ok(TokenResponse {
        access_token,
        token_type: "bearer".to_string(),
        user: UserResponse::from(user),
    })
}

pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    payload.validate()?;

    if !payload.consent {
        return Err(AppError::BadRequest("Consent is required".to_string()));
    }

    let email = payload.email.trim().to_lowercase();
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::BadRequest("Email already registered".to_string()));
    }

    let password_hash = hash(&payload.password, DEFAULT_COST)
        .map_err(|_| AppError::InternalServerError("Failed to hash password".to_string()))?;

    let user = User::new(email, password_hash, payload.name.trim().to_string(), UserRole::User, true);
    state.store.create_user(&user).await.map_err(|e| match e {
        StoreError::Conflict(_) => AppError::BadRequest("Email already registered".to_string()),
        other => AppError::from(other),
    })?;

    Ok(Json(issue_token(&state, user)?))
}

pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    payload.validate()?;

    let mut user = state
        .store
        .find_user_by_email(&payload.email.trim().to_lowercase())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let is_valid = verify(&payload.password, &user.password_hash)
        .map_err(|_| AppError::InternalServerError("Failed to verify password".to_string()))?;

    if !is_valid {
        return Err(AppError::Unauthorized("Invalid email or password".to_string()));
    }

    let now = Utc::now();
    state.store.record_login(user.id, now).await?;
    user.last_login = Some(now);

    Ok(Json(issue_token(&state, user)?))
}

pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<UserResponse>, AppError> {
    let user = state
        .store
        .find_user(auth_user.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(UserResponse::from(user)))
}

/// Creates the configured admin account unless that email already exists.
pub async fn seed_admin(store: &dyn InterviewStore, email: &str, password: &str) -> anyhow::Result<()> {
    let email = email.trim().to_lowercase();
    if store.find_user_by_email(&email).await?.is_some() {
        return Ok(());
    }

    let password_hash = hash(password, DEFAULT_COST)?;
    let admin = User::new(email.clone(), password_hash, "Admin".to_string(), UserRole::Admin, true);
    store.create_user(&admin).await?;

    tracing::info!("Seeded admin account {}", email);
    Ok(())
}
