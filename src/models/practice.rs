use serde::Serialize;
use uuid::Uuid;

use crate::models::interview::InterviewType;

#[derive(Debug, Clone, Serialize)]
pub struct PracticeQuestion {
    pub id: Uuid,
    pub category: InterviewType,
    pub question: String,
    pub ideal_answer: String,
    pub key_points: Vec<String>,
    pub common_mistakes: Vec<String>,
}
