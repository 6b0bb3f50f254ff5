use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::ReadinessStatus;

/// Mean of the four qualitative dimensions across a session, rounded to 2 dp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub clarity: f64,
    pub confidence: f64,
    pub structure: f64,
    pub relevance: f64,
}

impl ScoreBreakdown {
    /// Dimensions in their fixed reporting order.
    pub fn dimensions(&self) -> [(&'static str, f64); 4] {
        [
            ("clarity", self.clarity),
            ("confidence", self.confidence),
            ("structure", self.structure),
            ("relevance", self.relevance),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mistake {
    pub what_went_wrong: String,
    pub correction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEvaluation {
    pub id: Uuid,
    pub interview_id: Uuid,
    pub user_id: Uuid,
    pub overall_score: f64,
    pub breakdown: ScoreBreakdown,
    pub strengths: Vec<String>,
    pub mistakes: Vec<Mistake>,
    pub improvement_tips: Vec<String>,
    pub readiness_flag: ReadinessStatus,
    pub created_at: DateTime<Utc>,
}

/// Corrective feedback for a single answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerFeedback {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub mistakes: Vec<Mistake>,
    pub improved_answer: String,
    #[serde(default)]
    pub why_improved: String,
    #[serde(default)]
    pub tips: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedFeedback {
    pub question: String,
    pub your_answer: String,
    pub score: f64,
    pub improved_answer: String,
    pub why_improved: String,
    pub mistakes: Vec<Mistake>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DetailedEvaluation {
    #[serde(flatten)]
    pub evaluation: SessionEvaluation,
    /// Dimensions below the weak threshold, for labelling only.
    pub weak_dimensions: Vec<String>,
    pub detailed_feedback: Vec<DetailedFeedback>,
}
