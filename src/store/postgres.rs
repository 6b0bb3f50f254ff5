use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use std::time::Instant;
use uuid::Uuid;

use super::{CompletionRecord, InterviewStore, StoreError};
use crate::models::{
    evaluation::{Mistake, ScoreBreakdown, SessionEvaluation},
    interview::{Answer, InterviewSession, InterviewType, Question, SessionStatus},
    user::{ReadinessStatus, User, UserRole},
};
use crate::services::scoring::ProfileProgress;
use crate::utils::logger::LOGGER;

#[derive(Debug, FromRow)]
struct InterviewRow {
    id: Uuid,
    user_id: Uuid,
    interview_type: InterviewType,
    focus_area: Option<String>,
    status: SessionStatus,
    questions: Json<Vec<Question>>,
    answers: Json<Vec<Answer>>,
    overall_score: Option<f64>,
    version: i32,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<InterviewRow> for InterviewSession {
    fn from(row: InterviewRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            interview_type: row.interview_type,
            focus_area: row.focus_area,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            overall_score: row.overall_score,
            questions: row.questions.0,
            answers: row.answers.0,
            version: row.version,
        }
    }
}

#[derive(Debug, FromRow)]
struct EvaluationRow {
    id: Uuid,
    interview_id: Uuid,
    user_id: Uuid,
    overall_score: f64,
    breakdown: Json<ScoreBreakdown>,
    strengths: Json<Vec<String>>,
    mistakes: Json<Vec<Mistake>>,
    improvement_tips: Json<Vec<String>>,
    readiness_flag: ReadinessStatus,
    created_at: DateTime<Utc>,
}

impl From<EvaluationRow> for SessionEvaluation {
    fn from(row: EvaluationRow) -> Self {
        Self {
            id: row.id,
            interview_id: row.interview_id,
            user_id: row.user_id,
            overall_score: row.overall_score,
            breakdown: row.breakdown.0,
            strengths: row.strengths.0,
            mistakes: row.mistakes.0,
            improvement_tips: row.improvement_tips.0,
            readiness_flag: row.readiness_flag,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_interviews(
        &self,
        query: &str,
        bind_user: Option<Uuid>,
        limit: Option<i64>,
        before: Option<DateTime<Utc>>,
    ) -> Result<Vec<InterviewSession>, StoreError> {
        let start_time = Instant::now();

        let mut q = sqlx::query_as::<_, InterviewRow>(query);
        if let Some(user_id) = bind_user {
            q = q.bind(user_id);
        }
        if let Some(before) = before {
            q = q.bind(before);
        }
        if let Some(limit) = limit {
            q = q.bind(limit);
        }

        let rows = q.fetch_all(&self.pool).await?;
        LOGGER.log_database_query(query, start_time.elapsed().as_millis(), Some(rows.len()));

        Ok(rows.into_iter().map(InterviewSession::from).collect())
    }
}

#[async_trait]
impl InterviewStore for PgStore {
    async fn create_user(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, name, role, consent, total_interviews,
                               average_score, streak, last_practice_date, readiness_status,
                               last_login, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(user.role)
        .bind(user.consent)
        .bind(user.total_interviews)
        .bind(user.average_score)
        .bind(user.streak)
        .bind(user.last_practice_date)
        .bind(user.readiness_status)
        .bind(user.last_login)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn record_login(&self, user_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_users(&self, role: UserRole) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users WHERE role = $1 ORDER BY created_at DESC")
            .bind(role)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    async fn insert_interview(&self, session: &InterviewSession) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO interviews (id, user_id, interview_type, focus_area, status, questions,
                                    answers, overall_score, version, started_at, completed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.interview_type)
        .bind(&session.focus_area)
        .bind(session.status)
        .bind(Json(&session.questions))
        .bind(Json(&session.answers))
        .bind(session.overall_score)
        .bind(session.version)
        .bind(session.started_at)
        .bind(session.completed_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_interview(
        &self,
        interview_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<InterviewSession>, StoreError> {
        let row = sqlx::query_as::<_, InterviewRow>("SELECT * FROM interviews WHERE id = $1 AND user_id = $2")
            .bind(interview_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(InterviewSession::from))
    }

    async fn update_interview_rounds(&self, session: &InterviewSession) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE interviews
            SET questions = $1, answers = $2, version = version + 1
            WHERE id = $3 AND version = $4 AND status = 'in_progress'
            "#,
        )
        .bind(Json(&session.questions))
        .bind(Json(&session.answers))
        .bind(session.id)
        .bind(session.version)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_user_interviews(&self, user_id: Uuid, limit: i64) -> Result<Vec<InterviewSession>, StoreError> {
        self.fetch_interviews(
            "SELECT * FROM interviews WHERE user_id = $1 ORDER BY started_at DESC LIMIT $2",
            Some(user_id),
            Some(limit),
            None,
        )
        .await
    }

    async fn list_completed_interviews(
        &self,
        user_id: Option<Uuid>,
        limit: i64,
    ) -> Result<Vec<InterviewSession>, StoreError> {
        match user_id {
            Some(user_id) => {
                self.fetch_interviews(
                    "SELECT * FROM interviews WHERE user_id = $1 AND status = 'completed' \
                     ORDER BY completed_at ASC LIMIT $2",
                    Some(user_id),
                    Some(limit),
                    None,
                )
                .await
            }
            None => {
                self.fetch_interviews(
                    "SELECT * FROM interviews WHERE status = 'completed' ORDER BY completed_at ASC LIMIT $1",
                    None,
                    Some(limit),
                    None,
                )
                .await
            }
        }
    }

    async fn list_stale_interviews(&self, before: DateTime<Utc>) -> Result<Vec<InterviewSession>, StoreError> {
        self.fetch_interviews(
            "SELECT * FROM interviews WHERE status = 'in_progress' AND started_at < $1 \
             ORDER BY started_at ASC",
            None,
            None,
            Some(before),
        )
        .await
    }

    async fn finalize_interview(&self, record: &CompletionRecord) -> Result<bool, StoreError> {
        let session = &record.session;
        let evaluation = &record.evaluation;
        let completed_at = session.completed_at.unwrap_or_else(Utc::now);

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE interviews
            SET status = 'completed', completed_at = $1, overall_score = $2, version = version + 1
            WHERE id = $3 AND version = $4 AND status = 'in_progress'
            "#,
        )
        .bind(completed_at)
        .bind(session.overall_score)
        .bind(session.id)
        .bind(session.version)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"
            INSERT INTO evaluations (id, interview_id, user_id, overall_score, breakdown, strengths,
                                     mistakes, improvement_tips, readiness_flag, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(evaluation.id)
        .bind(evaluation.interview_id)
        .bind(evaluation.user_id)
        .bind(evaluation.overall_score)
        .bind(Json(&evaluation.breakdown))
        .bind(Json(&evaluation.strengths))
        .bind(Json(&evaluation.mistakes))
        .bind(Json(&evaluation.improvement_tips))
        .bind(evaluation.readiness_flag)
        .bind(evaluation.created_at)
        .execute(&mut *tx)
        .await?;

        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1 FOR UPDATE")
            .bind(session.user_id)
            .fetch_one(&mut *tx)
            .await?;

        let progress = ProfileProgress::after_completion(
            &user,
            record.raw_score,
            evaluation.readiness_flag,
            completed_at.date_naive(),
        );

        sqlx::query(
            r#"
            UPDATE users
            SET total_interviews = $1, average_score = $2, streak = $3,
                last_practice_date = $4, readiness_status = $5
            WHERE id = $6
            "#,
        )
        .bind(progress.total_interviews)
        .bind(progress.average_score)
        .bind(progress.streak)
        .bind(progress.last_practice_date)
        .bind(progress.readiness_status)
        .bind(session.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn find_evaluation(
        &self,
        interview_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SessionEvaluation>, StoreError> {
        let row = sqlx::query_as::<_, EvaluationRow>(
            "SELECT * FROM evaluations WHERE interview_id = $1 AND user_id = $2",
        )
        .bind(interview_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(SessionEvaluation::from))
    }
}
