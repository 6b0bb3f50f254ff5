//! Persistent record store for users, interview sessions and session evaluations.
//!
//! Engine operations receive the store as an `Arc<dyn InterviewStore>`. Writes that
//! mutate an interview are conditional on the `version` the caller read, so two
//! concurrent submissions for the same session cannot both land.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    evaluation::SessionEvaluation,
    interview::InterviewSession,
    user::{User, UserRole},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("{0}")]
    Conflict(String),
    #[error("database error: {0}")]
    Database(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                StoreError::Conflict("Resource already exists".to_string())
            }
            other => StoreError::Database(other.to_string()),
        }
    }
}

/// Everything written when a session completes. `session` is already in its
/// completed state; `session.version` is the version the engine read.
#[derive(Debug, Clone)]
pub struct CompletionRecord {
    pub session: InterviewSession,
    pub evaluation: SessionEvaluation,
    /// Unrounded session mean, used for the running profile average.
    pub raw_score: f64,
}

#[async_trait]
pub trait InterviewStore: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<(), StoreError>;

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn list_users(&self, role: UserRole) -> Result<Vec<User>, StoreError>;

    async fn insert_interview(&self, session: &InterviewSession) -> Result<(), StoreError>;

    /// Owned lookup: a session belonging to another user is reported as absent.
    async fn find_interview(
        &self,
        interview_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<InterviewSession>, StoreError>;

    /// Persists questions and answers if the stored version still equals
    /// `session.version`, bumping it. Returns `false` when the write lost a race.
    async fn update_interview_rounds(&self, session: &InterviewSession) -> Result<bool, StoreError>;

    /// Sessions of one user, most recently started first.
    async fn list_user_interviews(&self, user_id: Uuid, limit: i64) -> Result<Vec<InterviewSession>, StoreError>;

    /// Completed sessions in completion order, optionally for a single user.
    async fn list_completed_interviews(
        &self,
        user_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<InterviewSession>, StoreError>;

    /// In-progress sessions started before `before`, oldest first.
    async fn list_stale_interviews(&self, before: DateTime<Utc>) -> Result<Vec<InterviewSession>, StoreError>;

    /// Atomically marks the session completed, stores its evaluation and folds the
    /// result into the owner's profile. Returns `false` if the session changed
    /// since it was read or is already completed.
    async fn finalize_interview(&self, record: &CompletionRecord) -> Result<bool, StoreError>;

    async fn find_evaluation(
        &self,
        interview_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SessionEvaluation>, StoreError>;
}
