use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
    pub consent: bool,
    pub total_interviews: i32,
    pub average_score: f64,
    pub streak: i32,
    pub last_practice_date: Option<NaiveDate>,
    pub readiness_status: ReadinessStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(email: String, password_hash: String, name: String, role: UserRole, consent: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            password_hash,
            name,
            role,
            consent,
            total_interviews: 0,
            average_score: 0.0,
            streak: 0,
            last_practice_date: None,
            readiness_status: ReadinessStatus::NotReady,
            last_login: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(UserRole::User),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

/// Readiness classification derived from a session's overall score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "readiness_status")]
pub enum ReadinessStatus {
    #[serde(rename = "Ready")]
    #[sqlx(rename = "Ready")]
    Ready,
    #[serde(rename = "Needs Practice")]
    #[sqlx(rename = "Needs Practice")]
    NeedsPractice,
    #[serde(rename = "Not Ready")]
    #[sqlx(rename = "Not Ready")]
    NotReady,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    #[validate(length(min = 1, max = 120))]
    pub name: String,
    pub consent: bool,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
    pub total_interviews: i32,
    pub average_score: f64,
    pub streak: i32,
    pub readiness_status: ReadinessStatus,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub user: UserResponse,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
            last_login: user.last_login,
            total_interviews: user.total_interviews,
            average_score: user.average_score,
            streak: user.streak,
            readiness_status: user.readiness_status,
        }
    }
}
