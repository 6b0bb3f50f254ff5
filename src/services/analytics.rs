//! Read-only rollups over completed sessions, recomputed on every request.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

use crate::models::{
    interview::{InterviewSession, InterviewType},
    user::{ReadinessStatus, User, UserResponse, UserRole},
};
use crate::services::scoring::round2;
use crate::store::InterviewStore;
use crate::utils::{errors::EngineError, logger::LOGGER};

pub const USER_SESSION_LIMIT: i64 = 100;
pub const PLATFORM_SESSION_LIMIT: i64 = 1000;
/// Answers scoring below this count towards the failed-question index.
pub const FAILED_SCORE_THRESHOLD: f64 = 5.0;
pub const HIGH_CONFIDENCE: f64 = 8.0;
pub const MEDIUM_CONFIDENCE: f64 = 5.0;

const DASHBOARD_WEAK_AREAS: usize = 3;
const DETAIL_WEAK_AREAS: usize = 5;
const INSIGHT_WEAK_AREAS: usize = 10;
const INSIGHT_FAILED_QUESTIONS: usize = 5;
const LEADERBOARD_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub score: f64,
    #[serde(rename = "type")]
    pub interview_type: InterviewType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeakArea {
    pub area: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MistakeFrequency {
    pub mistake: String,
    pub frequency: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedQuestion {
    pub question: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfidenceDistribution {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Serialize)]
pub struct UserDashboard {
    pub overall_score: f64,
    pub total_interviews: i32,
    pub streak: i32,
    pub readiness_status: ReadinessStatus,
    pub growth_data: Vec<GrowthPoint>,
    pub weak_areas: Vec<WeakArea>,
}

#[derive(Debug, Serialize)]
pub struct UserDetail {
    pub user: UserResponse,
    pub interviews: Vec<InterviewSession>,
    pub growth_data: Vec<GrowthPoint>,
    pub weak_areas: Vec<WeakArea>,
}

#[derive(Debug, Serialize)]
pub struct PlatformDashboard {
    pub total_users: usize,
    pub ready_for_interview: usize,
    pub needs_practice: usize,
    pub active_this_week: usize,
    pub average_score: f64,
    pub top_performers: Vec<UserResponse>,
    pub weak_candidates: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct PlatformInsights {
    pub common_mistakes: Vec<MistakeFrequency>,
    pub most_failed_questions: Vec<FailedQuestion>,
    pub confidence_distribution: ConfidenceDistribution,
    pub total_interviews: usize,
}

/// Chronological score points, one per scored session.
pub fn growth_data(sessions: &[InterviewSession]) -> Vec<GrowthPoint> {
    let mut points: Vec<(DateTime<Utc>, GrowthPoint)> = sessions
        .iter()
        .filter_map(|s| {
            let completed_at = s.completed_at?;
            let score = s.overall_score?;
            Some((
                completed_at,
                GrowthPoint {
                    date: completed_at.date_naive(),
                    score,
                    interview_type: s.interview_type,
                },
            ))
        })
        .collect();
    points.sort_by_key(|(at, _)| *at);
    points.into_iter().map(|(_, point)| point).collect()
}

/// Counts descending; ties broken alphabetically so the ordering is stable.
fn top_counts(counts: HashMap<String, usize>, limit: usize) -> Vec<(String, usize)> {
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(limit);
    ranked
}

pub fn weakness_frequency(sessions: &[InterviewSession], limit: usize) -> Vec<(String, usize)> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for answer in sessions.iter().flat_map(|s| s.answers.iter()) {
        let weakness = answer.evaluation.weakness_identified.trim();
        if !weakness.is_empty() {
            *counts.entry(weakness.to_string()).or_default() += 1;
        }
    }
    top_counts(counts, limit)
}

pub fn failed_questions(sessions: &[InterviewSession], limit: usize) -> Vec<FailedQuestion> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for answer in sessions.iter().flat_map(|s| s.answers.iter()) {
        if answer.score < FAILED_SCORE_THRESHOLD {
            *counts.entry(answer.question.clone()).or_default() += 1;
        }
    }
    top_counts(counts, limit)
        .into_iter()
        .map(|(question, count)| FailedQuestion { question, count })
        .collect()
}

pub fn confidence_distribution(sessions: &[InterviewSession]) -> ConfidenceDistribution {
    let mut distribution = ConfidenceDistribution::default();
    for answer in sessions.iter().flat_map(|s| s.answers.iter()) {
        let confidence = answer.evaluation.confidence;
        if confidence >= HIGH_CONFIDENCE {
            distribution.high += 1;
        } else if confidence >= MEDIUM_CONFIDENCE {
            distribution.medium += 1;
        } else {
            distribution.low += 1;
        }
    }
    distribution
}

fn weak_areas(sessions: &[InterviewSession], limit: usize) -> Vec<WeakArea> {
    weakness_frequency(sessions, limit)
        .into_iter()
        .map(|(area, count)| WeakArea { area, count })
        .collect()
}

pub fn platform_dashboard(users: Vec<User>, now: DateTime<Utc>) -> PlatformDashboard {
    let week_ago = now - Duration::days(7);

    let ready_for_interview = users
        .iter()
        .filter(|u| u.readiness_status == ReadinessStatus::Ready)
        .count();
    let needs_practice = users
        .iter()
        .filter(|u| u.readiness_status == ReadinessStatus::NeedsPractice)
        .count();
    let active_this_week = users
        .iter()
        .filter(|u| u.last_login.map_or(false, |at| at > week_ago))
        .count();

    let practiced: Vec<&User> = users.iter().filter(|u| u.total_interviews > 0).collect();
    let average_score = if practiced.is_empty() {
        0.0
    } else {
        round2(practiced.iter().map(|u| u.average_score).sum::<f64>() / practiced.len() as f64)
    };

    let mut top_performers = users.clone();
    top_performers.sort_by(|a, b| b.average_score.total_cmp(&a.average_score));
    top_performers.truncate(LEADERBOARD_SIZE);

    let mut weak_candidates: Vec<User> = practiced.into_iter().cloned().collect();
    weak_candidates.sort_by(|a, b| a.average_score.total_cmp(&b.average_score));
    weak_candidates.truncate(LEADERBOARD_SIZE);

    PlatformDashboard {
        total_users: users.len(),
        ready_for_interview,
        needs_practice,
        active_this_week,
        average_score,
        top_performers: top_performers.into_iter().map(UserResponse::from).collect(),
        weak_candidates: weak_candidates.into_iter().map(UserResponse::from).collect(),
    }
}

pub struct AnalyticsService {
    store: Arc<dyn InterviewStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn InterviewStore>) -> Self {
        Self { store }
    }

    async fn user_with_sessions(&self, user_id: Uuid) -> Result<(User, Vec<InterviewSession>), EngineError> {
        let (user, sessions) = tokio::try_join!(
            self.store.find_user(user_id),
            self.store.list_completed_interviews(Some(user_id), USER_SESSION_LIMIT)
        )?;
        let user = user.ok_or_else(|| EngineError::NotFound("User not found".to_string()))?;
        Ok((user, sessions))
    }

    pub async fn get_user_dashboard(&self, user_id: Uuid) -> Result<UserDashboard, EngineError> {
        let (user, sessions) = self.user_with_sessions(user_id).await?;

        Ok(UserDashboard {
            overall_score: user.average_score,
            total_interviews: user.total_interviews,
            streak: user.streak,
            readiness_status: user.readiness_status,
            growth_data: growth_data(&sessions),
            weak_areas: weak_areas(&sessions, DASHBOARD_WEAK_AREAS),
        })
    }

    pub async fn get_user_detail(&self, user_id: Uuid) -> Result<UserDetail, EngineError> {
        let (user, sessions) = self.user_with_sessions(user_id).await?;

        Ok(UserDetail {
            user: UserResponse::from(user),
            growth_data: growth_data(&sessions),
            weak_areas: weak_areas(&sessions, DETAIL_WEAK_AREAS),
            interviews: sessions,
        })
    }

    pub async fn list_candidates(&self) -> Result<Vec<UserResponse>, EngineError> {
        let users = self.store.list_users(UserRole::User).await?;
        Ok(users.into_iter().map(UserResponse::from).collect())
    }

    pub async fn get_platform_dashboard(&self) -> Result<PlatformDashboard, EngineError> {
        let users = self.store.list_users(UserRole::User).await?;
        Ok(platform_dashboard(users, Utc::now()))
    }

    pub async fn get_platform_insights(&self) -> Result<PlatformInsights, EngineError> {
        let start_time = Instant::now();
        let sessions = self
            .store
            .list_completed_interviews(None, PLATFORM_SESSION_LIMIT)
            .await?;

        let insights = PlatformInsights {
            common_mistakes: weakness_frequency(&sessions, INSIGHT_WEAK_AREAS)
                .into_iter()
                .map(|(mistake, frequency)| MistakeFrequency { mistake, frequency })
                .collect(),
            most_failed_questions: failed_questions(&sessions, INSIGHT_FAILED_QUESTIONS),
            confidence_distribution: confidence_distribution(&sessions),
            total_interviews: sessions.len(),
        };

        LOGGER.log_performance_metric(
            "platform_insights_duration",
            start_time.elapsed().as_millis() as f64,
            HashMap::new(),
        );

        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::{Difficulty, Question, SessionStatus};
    use crate::store::MemoryStore;
    use crate::test_support::{answer_with, seeded_user};

    fn completed(user_id: Uuid, days_ago: i64, score: f64, answers: Vec<(&str, f64, &str)>) -> InterviewSession {
        let question = Question {
            id: Uuid::new_v4(),
            question: "Tell me about yourself.".to_string(),
            difficulty: Difficulty::Medium,
            number: 1,
        };
        let mut session = InterviewSession::new(user_id, InterviewType::Hr, None, question);
        session.status = SessionStatus::Completed;
        session.completed_at = Some(Utc::now() - Duration::days(days_ago));
        session.overall_score = Some(score);
        session.answers = answers
            .into_iter()
            .map(|(q, s, w)| answer_with(q, s, w))
            .collect();
        session
    }

    #[test]
    fn growth_data_is_chronological() {
        let user = Uuid::new_v4();
        let sessions = vec![completed(user, 1, 8.0, vec![]), completed(user, 3, 6.0, vec![])];

        let points = growth_data(&sessions);
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].score, 6.0);
        assert_eq!(points[1].score, 8.0);
        assert!(points[0].date < points[1].date);
    }

    #[test]
    fn weakness_frequency_ranks_by_count() {
        let user = Uuid::new_v4();
        let sessions = vec![
            completed(user, 1, 6.0, vec![("a", 6.0, "Structure"), ("b", 6.0, "Confidence")]),
            completed(user, 2, 6.0, vec![("c", 6.0, "Structure"), ("d", 6.0, " "), ("e", 6.0, "Clarity")]),
        ];

        let ranked = weakness_frequency(&sessions, 2);
        assert_eq!(
            ranked,
            vec![("Structure".to_string(), 2), ("Clarity".to_string(), 1)]
        );
    }

    #[test]
    fn failed_questions_only_count_scores_below_five() {
        let user = Uuid::new_v4();
        let sessions = vec![
            completed(user, 1, 5.0, vec![("Why us?", 4.9, "x"), ("Why us?", 5.0, "x"), ("Stack?", 2.0, "x")]),
            completed(user, 2, 5.0, vec![("Why us?", 1.0, "x")]),
        ];

        let failed = failed_questions(&sessions, 5);
        assert_eq!(failed[0], FailedQuestion { question: "Why us?".into(), count: 2 });
        assert_eq!(failed[1], FailedQuestion { question: "Stack?".into(), count: 1 });
    }

    #[test]
    fn confidence_buckets_use_inclusive_lower_bounds() {
        let user = Uuid::new_v4();
        let sessions = vec![completed(
            user,
            1,
            6.0,
            vec![("a", 8.0, "x"), ("b", 7.99, "x"), ("c", 5.0, "x"), ("d", 4.99, "x")],
        )];

        let distribution = confidence_distribution(&sessions);
        assert_eq!(distribution, ConfidenceDistribution { high: 1, medium: 2, low: 1 });
    }

    #[test]
    fn platform_dashboard_averages_only_practiced_users() {
        let now = Utc::now();
        let mut users = Vec::new();
        for (i, (total, avg, readiness)) in [
            (2, 8.5, ReadinessStatus::Ready),
            (1, 6.25, ReadinessStatus::NeedsPractice),
            (0, 0.0, ReadinessStatus::NotReady),
        ]
        .into_iter()
        .enumerate()
        {
            let mut user = User::new(format!("u{}@example.com", i), "h".into(), "U".into(), UserRole::User, true);
            user.total_interviews = total;
            user.average_score = avg;
            user.readiness_status = readiness;
            users.push(user);
        }
        users[0].last_login = Some(now - Duration::days(1));
        users[1].last_login = Some(now - Duration::days(30));

        let dashboard = platform_dashboard(users, now);
        assert_eq!(dashboard.total_users, 3);
        assert_eq!(dashboard.ready_for_interview, 1);
        assert_eq!(dashboard.needs_practice, 1);
        assert_eq!(dashboard.active_this_week, 1);
        assert_eq!(dashboard.average_score, 7.38);
        assert_eq!(dashboard.top_performers[0].average_score, 8.5);
        assert_eq!(dashboard.weak_candidates.len(), 2);
        assert_eq!(dashboard.weak_candidates[0].average_score, 6.25);
    }

    #[tokio::test]
    async fn user_dashboard_reads_profile_and_top_three_weak_areas() {
        let store = Arc::new(MemoryStore::new());
        let user = seeded_user(store.as_ref(), "dash@example.com").await;
        let session = completed(
            user.id,
            1,
            6.0,
            vec![
                ("a", 6.0, "Structure"),
                ("b", 6.0, "Structure"),
                ("c", 6.0, "Clarity"),
                ("d", 6.0, "Confidence"),
                ("e", 6.0, "Relevance"),
            ],
        );
        store.insert_interview(&session).await.unwrap();

        let service = AnalyticsService::new(store.clone());
        let dashboard = service.get_user_dashboard(user.id).await.unwrap();

        assert_eq!(dashboard.total_interviews, 0);
        assert_eq!(dashboard.growth_data.len(), 1);
        assert_eq!(dashboard.weak_areas.len(), 3);
        assert_eq!(dashboard.weak_areas[0], WeakArea { area: "Structure".into(), count: 2 });

        let missing = service.get_user_dashboard(Uuid::new_v4()).await;
        assert!(matches!(missing, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn insights_ignore_in_progress_sessions() {
        let store = Arc::new(MemoryStore::new());
        let user = seeded_user(store.as_ref(), "insight@example.com").await;
        store
            .insert_interview(&completed(user.id, 1, 3.0, vec![("Why us?", 3.0, "Clarity")]))
            .await
            .unwrap();
        let mut open = completed(user.id, 0, 3.0, vec![("Why us?", 3.0, "Clarity")]);
        open.status = SessionStatus::InProgress;
        store.insert_interview(&open).await.unwrap();

        let insights = AnalyticsService::new(store).get_platform_insights().await.unwrap();
        assert_eq!(insights.total_interviews, 1);
        assert_eq!(insights.most_failed_questions[0].count, 1);
        assert_eq!(insights.common_mistakes[0].frequency, 1);
        assert_eq!(insights.confidence_distribution.low, 1);
    }
}
