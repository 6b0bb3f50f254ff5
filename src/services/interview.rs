//! Interview session lifecycle: start, answer rounds, completion and review.
//!
//! Every operation is scoped to one session and its owner. Reads and writes of a
//! session are separated by oracle calls, so each write is conditional on the
//! version that was read; losing that race surfaces as `EngineError::Conflict`.

use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

use crate::models::{
    evaluation::{DetailedEvaluation, DetailedFeedback, SessionEvaluation},
    interview::{
        Answer, AnswerEvaluation, InterviewSession, InterviewType, Question, SessionStatus, SubmitAnswerResponse,
    },
};
use crate::services::{
    evaluator::AnswerEvaluator,
    feedback::FeedbackSynthesizer,
    oracle::GenerationOracle,
    question_generator::QuestionGenerator,
    scoring::{self, FeedbackPool},
};
use crate::store::{CompletionRecord, InterviewStore};
use crate::utils::{errors::EngineError, logger::LOGGER};

pub const HISTORY_LIMIT: i64 = 100;

const CONCURRENT_UPDATE: &str = "Interview was modified concurrently, please retry";

#[derive(Clone)]
pub struct InterviewEngine {
    store: Arc<dyn InterviewStore>,
    generator: QuestionGenerator,
    evaluator: AnswerEvaluator,
    feedback: FeedbackSynthesizer,
}

impl InterviewEngine {
    pub fn new(store: Arc<dyn InterviewStore>, oracle: Arc<dyn GenerationOracle>, oracle_timeout: Duration) -> Self {
        Self {
            store,
            generator: QuestionGenerator::new(oracle.clone(), oracle_timeout),
            evaluator: AnswerEvaluator::new(oracle.clone(), oracle_timeout),
            feedback: FeedbackSynthesizer::new(oracle, oracle_timeout),
        }
    }

    async fn owned_session(&self, user_id: Uuid, interview_id: Uuid) -> Result<InterviewSession, EngineError> {
        self.store
            .find_interview(interview_id, user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Interview not found".to_string()))
    }

    pub async fn start_session(
        &self,
        user_id: Uuid,
        interview_type: InterviewType,
        focus_area: Option<String>,
    ) -> Result<InterviewSession, EngineError> {
        let focus_area = focus_area.map(|f| f.trim().to_string()).filter(|f| !f.is_empty());
        let generated = self
            .generator
            .generate_question(interview_type, 1, &[], focus_area.as_deref())
            .await;

        let first = Question {
            id: Uuid::new_v4(),
            question: generated.question,
            difficulty: generated.difficulty,
            number: 1,
        };
        let session = InterviewSession::new(user_id, interview_type, focus_area, first);
        self.store.insert_interview(&session).await?;

        LOGGER.log_business_event(
            "interview_started",
            Some(user_id),
            [
                ("interview_id".to_string(), json!(session.id)),
                ("interview_type".to_string(), json!(interview_type.as_str())),
            ]
            .iter()
            .cloned()
            .collect(),
        );

        Ok(session)
    }

    pub async fn submit_answer(
        &self,
        user_id: Uuid,
        interview_id: Uuid,
        question_id: Uuid,
        answer_text: &str,
    ) -> Result<SubmitAnswerResponse, EngineError> {
        let mut session = self.owned_session(user_id, interview_id).await?;

        if session.is_completed() {
            return Err(EngineError::InvalidState("Interview already completed".to_string()));
        }
        let question_text = session
            .question(question_id)
            .map(|q| q.question.clone())
            .ok_or_else(|| EngineError::NotFound("Question not found".to_string()))?;
        if session.is_answered(question_id) {
            return Err(EngineError::InvalidState("Question already answered".to_string()));
        }
        if session.has_all_answers() {
            return Err(EngineError::InvalidState("All questions already answered".to_string()));
        }

        let evaluation = self
            .evaluator
            .evaluate_answer(&question_text, answer_text, session.interview_type)
            .await;

        session.answers.push(Answer {
            question_id,
            question: question_text,
            answer: answer_text.to_string(),
            score: evaluation.score,
            evaluation: evaluation.clone(),
            submitted_at: Utc::now(),
        });

        let is_complete = session.has_all_answers();
        let next_question = if is_complete {
            None
        } else {
            let number = session.answers.len() as i32 + 1;
            let generated = self
                .generator
                .generate_question(
                    session.interview_type,
                    number,
                    &session.answers,
                    session.focus_area.as_deref(),
                )
                .await;
            let question = Question {
                id: Uuid::new_v4(),
                question: generated.question,
                difficulty: generated.difficulty,
                number,
            };
            session.questions.push(question.clone());
            Some(question)
        };

        if !self.store.update_interview_rounds(&session).await? {
            return Err(EngineError::Conflict(CONCURRENT_UPDATE.to_string()));
        }

        LOGGER.log_business_event(
            "answer_submitted",
            Some(user_id),
            [
                ("interview_id".to_string(), json!(interview_id)),
                ("answer_count".to_string(), json!(session.answers.len())),
                ("score".to_string(), json!(evaluation.score)),
            ]
            .iter()
            .cloned()
            .collect(),
        );

        Ok(SubmitAnswerResponse {
            success: true,
            evaluation,
            next_question,
            is_complete,
        })
    }

    pub async fn complete_session(&self, user_id: Uuid, interview_id: Uuid) -> Result<SessionEvaluation, EngineError> {
        let start_time = Instant::now();
        let session = self.owned_session(user_id, interview_id).await?;

        if session.is_completed() {
            return Err(EngineError::InvalidState("Interview already completed".to_string()));
        }
        if !session.has_all_answers() {
            return Err(EngineError::InvalidState("Interview not complete".to_string()));
        }

        let evaluations: Vec<AnswerEvaluation> = session.evaluations().cloned().collect();
        let summary = scoring::aggregate(&evaluations);

        let mut pool = FeedbackPool::default();
        for answer in session.answers.iter().filter(|a| scoring::needs_feedback(a.score)) {
            let feedback = self
                .feedback
                .generate_feedback(&answer.question, &answer.answer, answer.score)
                .await;
            pool.add(&feedback);
        }
        let (mistakes, improvement_tips) = pool.finish();

        let completed_at = Utc::now();
        let overall_score = scoring::round2(summary.overall_score);
        let evaluation = SessionEvaluation {
            id: Uuid::new_v4(),
            interview_id,
            user_id,
            overall_score,
            breakdown: summary.breakdown,
            strengths: summary.strengths,
            mistakes,
            improvement_tips,
            readiness_flag: summary.readiness,
            created_at: completed_at,
        };

        let mut completed = session;
        completed.status = SessionStatus::Completed;
        completed.completed_at = Some(completed_at);
        completed.overall_score = Some(overall_score);

        let record = CompletionRecord {
            session: completed,
            evaluation: evaluation.clone(),
            raw_score: summary.overall_score,
        };
        if !self.store.finalize_interview(&record).await? {
            return Err(EngineError::Conflict(CONCURRENT_UPDATE.to_string()));
        }

        LOGGER.log_business_event(
            "interview_completed",
            Some(user_id),
            [
                ("interview_id".to_string(), json!(interview_id)),
                ("overall_score".to_string(), json!(overall_score)),
                ("readiness".to_string(), json!(evaluation.readiness_flag)),
            ]
            .iter()
            .cloned()
            .collect(),
        );
        LOGGER.log_performance_metric(
            "interview_completion_ms",
            start_time.elapsed().as_millis() as f64,
            HashMap::new(),
        );

        Ok(evaluation)
    }

    pub async fn get_session(&self, user_id: Uuid, interview_id: Uuid) -> Result<InterviewSession, EngineError> {
        self.owned_session(user_id, interview_id).await
    }

    pub async fn get_history(&self, user_id: Uuid) -> Result<Vec<InterviewSession>, EngineError> {
        Ok(self.store.list_user_interviews(user_id, HISTORY_LIMIT).await?)
    }

    /// Feedback for every answer is regenerated on each read.
    pub async fn get_detailed_evaluation(
        &self,
        user_id: Uuid,
        interview_id: Uuid,
    ) -> Result<DetailedEvaluation, EngineError> {
        let evaluation = self
            .store
            .find_evaluation(interview_id, user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound("Evaluation not found".to_string()))?;
        let session = self.owned_session(user_id, interview_id).await?;

        let mut detailed_feedback = Vec::with_capacity(session.answers.len());
        for answer in &session.answers {
            let feedback = self
                .feedback
                .generate_feedback(&answer.question, &answer.answer, answer.score)
                .await;
            detailed_feedback.push(DetailedFeedback {
                question: answer.question.clone(),
                your_answer: answer.answer.clone(),
                score: answer.score,
                improved_answer: feedback.improved_answer,
                why_improved: feedback.why_improved,
                mistakes: feedback.mistakes,
            });
        }

        Ok(DetailedEvaluation {
            weak_dimensions: scoring::weak_dimensions(&evaluation.breakdown),
            evaluation,
            detailed_feedback,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::interview::SESSION_LENGTH;
    use crate::models::user::{ReadinessStatus, User, UserRole};
    use crate::services::oracle::OraclePurpose;
    use crate::test_support::{engine_with, evaluation_json, feedback_json, seeded_user, ScriptedOracle, TestEngine};

    async fn answer_rounds(t: &TestEngine, user_id: Uuid, session: &InterviewSession, rounds: usize) {
        let mut current = session.questions[0].clone();
        for round in 0..rounds {
            let response = t
                .engine
                .submit_answer(user_id, session.id, current.id, "I led the migration and measured the results.")
                .await
                .unwrap();

            let stored = t.engine.get_session(user_id, session.id).await.unwrap();
            assert!(stored.answers.len() <= stored.questions.len());
            assert!(stored.questions.len() <= SESSION_LENGTH);
            assert_eq!(stored.answers.len(), round + 1);

            match response.next_question {
                Some(next) => {
                    assert!(!response.is_complete);
                    assert_eq!(next.number as usize, round + 2);
                    current = next;
                }
                None => assert!(response.is_complete),
            }
        }
    }

    #[tokio::test]
    async fn start_persists_an_in_progress_session_with_one_question() {
        let t = engine_with(ScriptedOracle::failing());
        let user = seeded_user(t.store.as_ref(), "start@example.com").await;

        let session = t
            .engine
            .start_session(user.id, InterviewType::Technical, Some("  ".to_string()))
            .await
            .unwrap();

        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.questions.len(), 1);
        assert_eq!(session.questions[0].question, "Explain a project you have worked on.");
        assert!(session.focus_area.is_none());
        assert!(t.engine.get_session(user.id, session.id).await.is_ok());
    }

    #[tokio::test]
    async fn full_session_completes_even_when_the_oracle_is_down() {
        let t = engine_with(ScriptedOracle::failing());
        let user = seeded_user(t.store.as_ref(), "down@example.com").await;
        let session = t.engine.start_session(user.id, InterviewType::Hr, None).await.unwrap();

        answer_rounds(&t, user.id, &session, SESSION_LENGTH).await;
        let evaluation = t.engine.complete_session(user.id, session.id).await.unwrap();

        assert_eq!(evaluation.overall_score, 6.5);
        assert_eq!(evaluation.readiness_flag, ReadinessStatus::NeedsPractice);
        assert_eq!(evaluation.mistakes.len(), 3);
        assert_eq!(evaluation.improvement_tips, vec!["Practice STAR method"]);
        assert_eq!(
            evaluation.strengths,
            vec!["Completed the interview", "Attempted all questions"]
        );

        let stored = t.engine.get_session(user.id, session.id).await.unwrap();
        assert_eq!(stored.status, SessionStatus::Completed);
        assert_eq!(stored.overall_score, Some(6.5));

        let profile = t.store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(profile.total_interviews, 1);
        assert_eq!(profile.average_score, 6.5);
        assert_eq!(profile.streak, 1);
    }

    #[tokio::test]
    async fn completing_with_three_answers_is_rejected_without_side_effects() {
        let t = engine_with(ScriptedOracle::failing());
        let user = seeded_user(t.store.as_ref(), "early@example.com").await;
        let session = t.engine.start_session(user.id, InterviewType::Hr, None).await.unwrap();
        answer_rounds(&t, user.id, &session, 3).await;
        let before = t.engine.get_session(user.id, session.id).await.unwrap();

        let result = t.engine.complete_session(user.id, session.id).await;
        assert!(matches!(result, Err(EngineError::InvalidState(_))));

        let after = t.engine.get_session(user.id, session.id).await.unwrap();
        assert_eq!(after.status, SessionStatus::InProgress);
        assert_eq!(after.version, before.version);
        assert!(t.store.find_evaluation(session.id, user.id).await.unwrap().is_none());
        assert_eq!(t.store.find_user(user.id).await.unwrap().unwrap().total_interviews, 0);
    }

    #[tokio::test]
    async fn completion_folds_into_the_running_average() {
        let t = engine_with(ScriptedOracle::new().with_evaluation(evaluation_json(9.0, 9.0, "Pacing")));
        let mut user = User::new(
            "veteran@example.com".into(),
            "hash".into(),
            "Vet".into(),
            UserRole::User,
            true,
        );
        user.total_interviews = 3;
        user.average_score = 7.0;
        t.store.create_user(&user).await.unwrap();

        let session = t
            .engine
            .start_session(user.id, InterviewType::Behavioral, None)
            .await
            .unwrap();
        answer_rounds(&t, user.id, &session, SESSION_LENGTH).await;
        let evaluation = t.engine.complete_session(user.id, session.id).await.unwrap();

        assert_eq!(evaluation.overall_score, 9.0);
        assert_eq!(evaluation.readiness_flag, ReadinessStatus::Ready);
        assert_eq!(t.oracle.calls(OraclePurpose::Feedback), 0);
        assert_eq!(evaluation.improvement_tips.len(), 3);

        let profile = t.store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(profile.total_interviews, 4);
        assert_eq!(profile.average_score, 7.5);
        assert_eq!(profile.readiness_status, ReadinessStatus::Ready);
    }

    #[tokio::test]
    async fn weak_answers_produce_capped_deduplicated_feedback() {
        let oracle = ScriptedOracle::new()
            .with_evaluation(evaluation_json(4.0, 4.0, "Structure"))
            .with_feedback(feedback_json("No STAR", "Use STAR"))
            .with_feedback(feedback_json("Vague", "Use STAR"))
            .with_feedback(feedback_json("Rambling", "Be concise"))
            .with_feedback(feedback_json("No metrics", "Quantify results"))
            .with_feedback(feedback_json("Too short", "Add detail"));
        let t = engine_with(oracle);
        let user = seeded_user(t.store.as_ref(), "weak@example.com").await;
        let session = t.engine.start_session(user.id, InterviewType::Hr, None).await.unwrap();
        answer_rounds(&t, user.id, &session, SESSION_LENGTH).await;

        let evaluation = t.engine.complete_session(user.id, session.id).await.unwrap();

        assert_eq!(t.oracle.calls(OraclePurpose::Feedback), 5);
        assert_eq!(evaluation.mistakes.len(), 3);
        assert_eq!(evaluation.mistakes[0].what_went_wrong, "No STAR");
        assert_eq!(
            evaluation.improvement_tips,
            vec!["Use STAR", "Be concise", "Quantify results"]
        );
        assert_eq!(evaluation.readiness_flag, ReadinessStatus::NotReady);
    }

    #[tokio::test]
    async fn sessions_of_other_users_are_not_found() {
        let t = engine_with(ScriptedOracle::failing());
        let owner = seeded_user(t.store.as_ref(), "owner@example.com").await;
        let intruder = seeded_user(t.store.as_ref(), "intruder@example.com").await;
        let session = t.engine.start_session(owner.id, InterviewType::Hr, None).await.unwrap();
        let question_id = session.questions[0].id;

        let result = t.engine.submit_answer(intruder.id, session.id, question_id, "hi").await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));
        let result = t.engine.complete_session(intruder.id, session.id).await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));
        let result = t.engine.submit_answer(owner.id, session.id, Uuid::new_v4(), "hi").await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn answering_the_same_question_twice_is_rejected() {
        let t = engine_with(ScriptedOracle::failing());
        let user = seeded_user(t.store.as_ref(), "twice@example.com").await;
        let session = t.engine.start_session(user.id, InterviewType::Hr, None).await.unwrap();
        let question_id = session.questions[0].id;

        t.engine
            .submit_answer(user.id, session.id, question_id, "first")
            .await
            .unwrap();
        let result = t.engine.submit_answer(user.id, session.id, question_id, "again").await;
        assert!(matches!(result, Err(EngineError::InvalidState(_))));
    }

    #[tokio::test]
    async fn completed_sessions_are_terminal() {
        let t = engine_with(ScriptedOracle::failing());
        let user = seeded_user(t.store.as_ref(), "terminal@example.com").await;
        let session = t.engine.start_session(user.id, InterviewType::Hr, None).await.unwrap();
        answer_rounds(&t, user.id, &session, SESSION_LENGTH).await;
        t.engine.complete_session(user.id, session.id).await.unwrap();

        let again = t.engine.complete_session(user.id, session.id).await;
        assert!(matches!(again, Err(EngineError::InvalidState(_))));
        let stored = t.engine.get_session(user.id, session.id).await.unwrap();
        let last = stored.questions.last().unwrap().id;
        let late = t.engine.submit_answer(user.id, session.id, last, "late").await;
        assert!(matches!(late, Err(EngineError::InvalidState(_))));
        assert_eq!(t.store.find_user(user.id).await.unwrap().unwrap().total_interviews, 1);
    }

    #[tokio::test]
    async fn concurrent_submissions_for_one_session_do_not_both_land() {
        let t = engine_with(ScriptedOracle::sleeping(Duration::from_millis(20)));
        let user = seeded_user(t.store.as_ref(), "race@example.com").await;
        let session = t.engine.start_session(user.id, InterviewType::Hr, None).await.unwrap();
        let question_id = session.questions[0].id;

        let (a, b) = tokio::join!(
            t.engine.submit_answer(user.id, session.id, question_id, "first"),
            t.engine.submit_answer(user.id, session.id, question_id, "second"),
        );

        assert!(a.is_ok() ^ b.is_ok());
        assert!(matches!(a.err().or(b.err()), Some(EngineError::Conflict(_))));
        let stored = t.engine.get_session(user.id, session.id).await.unwrap();
        assert_eq!(stored.answers.len(), 1);
        assert_eq!(stored.questions.len(), 2);
    }

    #[tokio::test]
    async fn detailed_evaluation_regenerates_feedback_per_answer() {
        let t = engine_with(ScriptedOracle::failing());
        let user = seeded_user(t.store.as_ref(), "review@example.com").await;
        let session = t.engine.start_session(user.id, InterviewType::Hr, None).await.unwrap();

        let missing = t.engine.get_detailed_evaluation(user.id, session.id).await;
        assert!(matches!(missing, Err(EngineError::NotFound(_))));

        answer_rounds(&t, user.id, &session, SESSION_LENGTH).await;
        t.engine.complete_session(user.id, session.id).await.unwrap();
        let calls_before = t.oracle.calls(OraclePurpose::Feedback);

        let detailed = t.engine.get_detailed_evaluation(user.id, session.id).await.unwrap();
        assert_eq!(detailed.detailed_feedback.len(), SESSION_LENGTH);
        assert_eq!(t.oracle.calls(OraclePurpose::Feedback), calls_before + SESSION_LENGTH);
        assert!(detailed.weak_dimensions.is_empty());
        assert_eq!(detailed.detailed_feedback[0].question, "Tell me about yourself.");
    }

    #[tokio::test]
    async fn history_lists_most_recent_first() {
        let t = engine_with(ScriptedOracle::failing());
        let user = seeded_user(t.store.as_ref(), "history@example.com").await;
        let first = t.engine.start_session(user.id, InterviewType::Hr, None).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = t.engine.start_session(user.id, InterviewType::Technical, None).await.unwrap();

        let history = t.engine.get_history(user.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, second.id);
        assert_eq!(history[1].id, first.id);
    }
}
