use std::sync::Arc;
use std::time::Duration;

use crate::models::evaluation::{AnswerFeedback, Mistake};
use crate::services::oracle::{ask, record_fallback, GenerationOracle, OracleOutcome, OraclePurpose, OracleRequest};

const SYSTEM_PROMPT: &str = "You are an expert interview coach. Always return valid JSON only.";

pub fn fallback_feedback() -> AnswerFeedback {
    AnswerFeedback {
        strengths: vec![
            "Attempted to answer".to_string(),
            "Showed some understanding".to_string(),
        ],
        mistakes: vec![Mistake {
            what_went_wrong: "Lacked structure".to_string(),
            correction: "Use STAR method".to_string(),
        }],
        improved_answer: "Consider structuring your answer with clear examples".to_string(),
        why_improved: "Better structure helps communicate your experience".to_string(),
        tips: vec![
            "Practice STAR method".to_string(),
            "Use specific examples".to_string(),
            "Be concise".to_string(),
        ],
    }
}

/// Stateless per call; aggregation and deduplication belong to the caller.
#[derive(Clone)]
pub struct FeedbackSynthesizer {
    oracle: Arc<dyn GenerationOracle>,
    timeout: Duration,
}

impl FeedbackSynthesizer {
    pub fn new(oracle: Arc<dyn GenerationOracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    pub async fn generate_feedback(&self, question: &str, answer: &str, score: f64) -> AnswerFeedback {
        let request = OracleRequest {
            purpose: OraclePurpose::Feedback,
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(question, answer, score),
        };

        match ask::<AnswerFeedback>(self.oracle.as_ref(), &request, self.timeout).await {
            OracleOutcome::Parsed(feedback) => tidy(feedback),
            OracleOutcome::Malformed(reason) => {
                record_fallback(OraclePurpose::Feedback, &reason);
                fallback_feedback()
            }
        }
    }
}

fn tidy(mut feedback: AnswerFeedback) -> AnswerFeedback {
    feedback.strengths.retain(|s| !s.trim().is_empty());
    feedback.tips.retain(|t| !t.trim().is_empty());
    feedback
        .mistakes
        .retain(|m| !m.what_went_wrong.trim().is_empty());
    feedback
}

fn build_prompt(question: &str, answer: &str, score: f64) -> String {
    format!(
        r#"Generate feedback for this interview answer:

Question: {question}
Candidate's Answer: {answer}
Score: {score}/10

Provide feedback in ONLY valid JSON format:
{{
    "strengths": ["strength1", "strength2"],
    "mistakes": [
        {{"what_went_wrong": "issue", "correction": "how to fix it"}}
    ],
    "improved_answer": "A better version of the answer",
    "why_improved": "Explanation of improvements",
    "tips": ["tip1", "tip2", "tip3"]
}}

Return ONLY the JSON object, no other text."#,
        question = question,
        answer = answer,
        score = score
    )
}
