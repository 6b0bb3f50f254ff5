use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Number of question/answer rounds in every session.
pub const SESSION_LENGTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_type")]
pub enum InterviewType {
    #[serde(rename = "HR")]
    #[sqlx(rename = "HR")]
    Hr,
    Technical,
    Behavioral,
}

impl InterviewType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::Hr => "HR",
            InterviewType::Technical => "Technical",
            InterviewType::Behavioral => "Behavioral",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "interview_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Lenient label parsing; anything unrecognised is treated as medium.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "easy" => Difficulty::Easy,
            "hard" => Difficulty::Hard,
            _ => Difficulty::Medium,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub question: String,
    pub difficulty: Difficulty,
    pub number: i32,
}

/// Per-answer scoring produced by the answer evaluator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerEvaluation {
    pub score: f64,
    pub clarity: f64,
    pub confidence: f64,
    pub structure: f64,
    pub relevance: f64,
    pub explanation: String,
    pub weakness_identified: String,
    #[serde(default)]
    pub explainability_tags: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: Uuid,
    pub question: String,
    pub answer: String,
    pub score: f64,
    pub evaluation: AnswerEvaluation,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub interview_type: InterviewType,
    pub focus_area: Option<String>,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub overall_score: Option<f64>,
    pub questions: Vec<Question>,
    pub answers: Vec<Answer>,
    #[serde(skip_serializing, default)]
    pub version: i32,
}

impl InterviewSession {
    pub fn new(
        user_id: Uuid,
        interview_type: InterviewType,
        focus_area: Option<String>,
        first_question: Question,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            interview_type,
            focus_area,
            status: SessionStatus::InProgress,
            started_at: Utc::now(),
            completed_at: None,
            overall_score: None,
            questions: vec![first_question],
            answers: Vec::new(),
            version: 0,
        }
    }

    pub fn question(&self, question_id: Uuid) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    pub fn is_answered(&self, question_id: Uuid) -> bool {
        self.answers.iter().any(|a| a.question_id == question_id)
    }

    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    pub fn has_all_answers(&self) -> bool {
        self.answers.len() >= SESSION_LENGTH
    }

    pub fn evaluations(&self) -> impl Iterator<Item = &AnswerEvaluation> {
        self.answers.iter().map(|a| &a.evaluation)
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct StartInterviewRequest {
    pub interview_type: InterviewType,
    #[validate(length(max = 200))]
    pub focus_area: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    pub interview_id: Uuid,
    pub question_id: Uuid,
    #[validate(length(min = 1, max = 5000))]
    pub answer_text: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitAnswerResponse {
    pub success: bool,
    pub evaluation: AnswerEvaluation,
    pub next_question: Option<Question>,
    pub is_complete: bool,
}
