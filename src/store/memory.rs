use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use super::{CompletionRecord, InterviewStore, StoreError};
use crate::models::{
    evaluation::SessionEvaluation,
    interview::{InterviewSession, SessionStatus},
    user::{User, UserRole},
};
use crate::services::scoring::ProfileProgress;

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<Uuid, User>,
    interviews: HashMap<Uuid, InterviewSession>,
    evaluations: HashMap<Uuid, SessionEvaluation>,
}

/// Process-local store. Every operation holds the lock for its whole body, so
/// each call is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryState>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryState>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl InterviewStore for MemoryStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("Resource already exists".to_string()));
        }
        state.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.read()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let user = state.users.get_mut(&user_id).ok_or(StoreError::NotFound)?;
        user.last_login = Some(at);
        Ok(())
    }

    async fn list_users(&self, role: UserRole) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self
            .read()?
            .users
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn insert_interview(&self, session: &InterviewSession) -> Result<(), StoreError> {
        let mut state = self.write()?;
        if state.interviews.contains_key(&session.id) {
            return Err(StoreError::Conflict("Resource already exists".to_string()));
        }
        state.interviews.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_interview(
        &self,
        interview_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<InterviewSession>, StoreError> {
        Ok(self
            .read()?
            .interviews
            .get(&interview_id)
            .filter(|s| s.user_id == user_id)
            .cloned())
    }

    async fn update_interview_rounds(&self, session: &InterviewSession) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        let stored = match state.interviews.get_mut(&session.id) {
            Some(stored) => stored,
            None => return Err(StoreError::NotFound),
        };

        if stored.version != session.version || stored.status != SessionStatus::InProgress {
            return Ok(false);
        }

        stored.questions = session.questions.clone();
        stored.answers = session.answers.clone();
        stored.version += 1;
        Ok(true)
    }

    async fn list_user_interviews(&self, user_id: Uuid, limit: i64) -> Result<Vec<InterviewSession>, StoreError> {
        let mut sessions: Vec<InterviewSession> = self
            .read()?
            .interviews
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        sessions.truncate(limit.max(0) as usize);
        Ok(sessions)
    }

    async fn list_completed_interviews(
        &self,
        user_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<InterviewSession>, StoreError> {
        let mut sessions: Vec<InterviewSession> = self
            .read()?
            .interviews
            .values()
            .filter(|s| s.status == SessionStatus::Completed)
            .filter(|s| user_id.map_or(true, |id| s.user_id == id))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.completed_at.cmp(&b.completed_at));
        sessions.truncate(limit.max(0) as usize);
        Ok(sessions)
    }

    async fn list_stale_interviews(&self, before: DateTime<Utc>) -> Result<Vec<InterviewSession>, StoreError> {
        let mut sessions: Vec<InterviewSession> = self
            .read()?
            .interviews
            .values()
            .filter(|s| s.status == SessionStatus::InProgress && s.started_at < before)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.started_at.cmp(&b.started_at));
        Ok(sessions)
    }

    async fn finalize_interview(&self, record: &CompletionRecord) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        let session = &record.session;

        match state.interviews.get(&session.id) {
            Some(stored) if stored.version == session.version && stored.status == SessionStatus::InProgress => {}
            Some(_) => return Ok(false),
            None => return Err(StoreError::NotFound),
        }

        let user = state.users.get(&session.user_id).ok_or(StoreError::NotFound)?;
        let completed_on = session.completed_at.unwrap_or_else(Utc::now).date_naive();
        let progress = ProfileProgress::after_completion(
            user,
            record.raw_score,
            record.evaluation.readiness_flag,
            completed_on,
        );

        if let Some(user) = state.users.get_mut(&session.user_id) {
            progress.apply(user);
        }

        let mut completed = session.clone();
        completed.version += 1;
        state.interviews.insert(completed.id, completed);
        state
            .evaluations
            .insert(record.evaluation.interview_id, record.evaluation.clone());

        Ok(true)
    }

    async fn find_evaluation(
        &self,
        interview_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SessionEvaluation>, StoreError> {
        Ok(self
            .read()?
            .evaluations
            .get(&interview_id)
            .filter(|e| e.user_id == user_id)
            .cloned())
    }
}
