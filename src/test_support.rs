//! Test doubles shared by the unit tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::models::interview::{Answer, AnswerEvaluation};
use crate::models::user::{User, UserRole};
use crate::services::interview::InterviewEngine;
use crate::services::oracle::{GenerationOracle, OracleError, OraclePurpose, OracleRequest};
use crate::store::{InterviewStore, MemoryStore};

enum Mode {
    Scripted,
    Failing,
    Sleeping(Duration),
}

/// Oracle returning canned text per purpose. A queue hands out its entries in
/// order and then keeps repeating the last one; an empty queue is an error.
pub struct ScriptedOracle {
    mode: Mode,
    scripts: Mutex<HashMap<OraclePurpose, VecDeque<String>>>,
    calls: Mutex<HashMap<OraclePurpose, usize>>,
}

impl ScriptedOracle {
    fn with_mode(mode: Mode) -> Self {
        Self {
            mode,
            scripts: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
        }
    }

    pub fn new() -> Self {
        Self::with_mode(Mode::Scripted)
    }

    pub fn failing() -> Self {
        Self::with_mode(Mode::Failing)
    }

    pub fn sleeping(delay: Duration) -> Self {
        Self::with_mode(Mode::Sleeping(delay))
    }

    pub fn script(self, purpose: OraclePurpose, text: impl Into<String>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(purpose)
            .or_default()
            .push_back(text.into());
        self
    }

    pub fn with_question(self, text: impl Into<String>) -> Self {
        self.script(OraclePurpose::Question, text)
    }

    pub fn with_evaluation(self, text: impl Into<String>) -> Self {
        self.script(OraclePurpose::Evaluation, text)
    }

    pub fn with_feedback(self, text: impl Into<String>) -> Self {
        self.script(OraclePurpose::Feedback, text)
    }

    pub fn calls(&self, purpose: OraclePurpose) -> usize {
        self.calls.lock().unwrap().get(&purpose).copied().unwrap_or(0)
    }
}

#[async_trait]
impl GenerationOracle for ScriptedOracle {
    async fn generate(&self, request: &OracleRequest) -> Result<String, OracleError> {
        *self.calls.lock().unwrap().entry(request.purpose).or_default() += 1;

        match &self.mode {
            Mode::Failing => Err(OracleError::EmptyResponse),
            Mode::Sleeping(delay) => {
                tokio::time::sleep(*delay).await;
                Err(OracleError::EmptyResponse)
            }
            Mode::Scripted => {
                let mut scripts = self.scripts.lock().unwrap();
                let queue = scripts.get_mut(&request.purpose).ok_or(OracleError::EmptyResponse)?;
                let text = if queue.len() > 1 { queue.pop_front() } else { queue.front().cloned() };
                text.ok_or(OracleError::EmptyResponse)
            }
        }
    }
}

pub fn evaluation_json(score: f64, confidence: f64, weakness: &str) -> String {
    serde_json::json!({
        "score": score,
        "clarity": score,
        "confidence": confidence,
        "structure": score,
        "relevance": score,
        "explanation": "scripted",
        "weakness_identified": weakness,
        "explainability_tags": ["scripted"]
    })
    .to_string()
}

pub fn feedback_json(mistake: &str, tip: &str) -> String {
    serde_json::json!({
        "strengths": ["Tried"],
        "mistakes": [{ "what_went_wrong": mistake, "correction": format!("Avoid {}", mistake) }],
        "improved_answer": "A sharper answer",
        "why_improved": "More specific",
        "tips": [tip]
    })
    .to_string()
}

pub fn evaluation_with(score: f64, confidence: f64, weakness: &str) -> AnswerEvaluation {
    AnswerEvaluation {
        score,
        clarity: score,
        confidence,
        structure: score,
        relevance: score,
        explanation: "scripted".to_string(),
        weakness_identified: weakness.to_string(),
        explainability_tags: Vec::new(),
    }
}

pub fn answer_with(question: &str, score: f64, weakness: &str) -> Answer {
    Answer {
        question_id: Uuid::new_v4(),
        question: question.to_string(),
        answer: "My answer".to_string(),
        score,
        evaluation: evaluation_with(score, score, weakness),
        submitted_at: Utc::now(),
    }
}

pub struct TestEngine {
    pub store: Arc<MemoryStore>,
    pub oracle: Arc<ScriptedOracle>,
    pub engine: InterviewEngine,
}

pub fn engine_with(oracle: ScriptedOracle) -> TestEngine {
    let store = Arc::new(MemoryStore::new());
    let oracle = Arc::new(oracle);
    let engine = InterviewEngine::new(
        store.clone() as Arc<dyn InterviewStore>,
        oracle.clone() as Arc<dyn GenerationOracle>,
        Duration::from_millis(100),
    );
    TestEngine { store, oracle, engine }
}

pub async fn seeded_user(store: &dyn InterviewStore, email: &str) -> User {
    let user = User::new(
        email.to_string(),
        bcrypt::hash("password123", 4).unwrap(),
        "Test User".to_string(),
        UserRole::User,
        true,
    );
    store.create_user(&user).await.unwrap();
    user
}
