use serde::Deserialize;
use std::fmt::Write;
use std::sync::Arc;
use std::time::Duration;

use crate::models::interview::{Answer, Difficulty, InterviewType};
use crate::services::oracle::{ask, record_fallback, GenerationOracle, OracleOutcome, OraclePurpose, OracleRequest};
use crate::services::question_bank::fallback_question;

const SYSTEM_PROMPT: &str = "You are an expert interview question generator. Always return valid JSON only.";

#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuestion {
    pub question: String,
    pub difficulty: Difficulty,
    pub expected_elements: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionDraft {
    question: String,
    #[serde(default)]
    difficulty: Option<String>,
    #[serde(default)]
    expected_elements: Vec<String>,
}

/// Adaptive question sequencer. One oracle attempt per question, then the
/// canned list for the interview type.
#[derive(Clone)]
pub struct QuestionGenerator {
    oracle: Arc<dyn GenerationOracle>,
    timeout: Duration,
}

impl QuestionGenerator {
    pub fn new(oracle: Arc<dyn GenerationOracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    pub async fn generate_question(
        &self,
        interview_type: InterviewType,
        question_number: i32,
        previous_answers: &[Answer],
        focus_area: Option<&str>,
    ) -> GeneratedQuestion {
        let request = OracleRequest {
            purpose: OraclePurpose::Question,
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(interview_type, question_number, previous_answers, focus_area),
        };

        match ask::<QuestionDraft>(self.oracle.as_ref(), &request, self.timeout).await {
            OracleOutcome::Parsed(draft) if !draft.question.trim().is_empty() => GeneratedQuestion {
                question: draft.question.trim().to_string(),
                difficulty: draft
                    .difficulty
                    .as_deref()
                    .map(Difficulty::from_label)
                    .unwrap_or_default(),
                expected_elements: draft.expected_elements,
            },
            OracleOutcome::Parsed(_) => {
                record_fallback(OraclePurpose::Question, "empty question text");
                fallback(interview_type, question_number)
            }
            OracleOutcome::Malformed(reason) => {
                record_fallback(OraclePurpose::Question, &reason);
                fallback(interview_type, question_number)
            }
        }
    }
}

pub fn fallback(interview_type: InterviewType, question_number: i32) -> GeneratedQuestion {
    GeneratedQuestion {
        question: fallback_question(interview_type, question_number).to_string(),
        difficulty: Difficulty::Medium,
        expected_elements: vec!["clarity".to_string(), "relevance".to_string()],
    }
}

/// Prior rounds are condensed to question text and score; evaluation detail
/// never reaches the prompt.
fn build_prompt(
    interview_type: InterviewType,
    question_number: i32,
    previous_answers: &[Answer],
    focus_area: Option<&str>,
) -> String {
    let mut context = format!(
        "Interview Type: {}\nQuestion Number: {}\n",
        interview_type.as_str(),
        question_number
    );

    if let Some(focus) = focus_area.filter(|f| !f.trim().is_empty()) {
        let _ = writeln!(context, "Focus Area: {}", focus.trim());
    }

    if !previous_answers.is_empty() {
        context.push_str("\nPrevious Performance:\n");
        for (i, answer) in previous_answers.iter().enumerate() {
            let _ = writeln!(context, "Q{}: {}", i + 1, answer.question);
            let _ = writeln!(context, "Score: {}/10", answer.score);
        }
    }

    format!(
        r#"{context}
Generate an adaptive interview question. Return ONLY valid JSON in this exact format:
{{
    "question": "The interview question here",
    "difficulty": "easy|medium|hard",
    "expected_elements": ["element1", "element2"]
}}

Rules:
- For {kind} interviews
- Adjust difficulty based on previous performance
- Make it relevant and realistic
- Return ONLY the JSON object, no other text"#,
        context = context,
        kind = interview_type.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{answer_with, ScriptedOracle};

    fn generator(oracle: ScriptedOracle) -> QuestionGenerator {
        QuestionGenerator::new(Arc::new(oracle), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn uses_the_oracle_question_when_well_formed() {
        let oracle = ScriptedOracle::new().with_question(
            r#"{"question":"How would you shard a queue?","difficulty":"hard","expected_elements":["partitioning"]}"#,
        );
        let q = generator(oracle)
            .generate_question(InterviewType::Technical, 2, &[], None)
            .await;

        assert_eq!(q.question, "How would you shard a queue?");
        assert_eq!(q.difficulty, Difficulty::Hard);
        assert_eq!(q.expected_elements, vec!["partitioning"]);
    }

    #[tokio::test]
    async fn malformed_output_falls_back_deterministically() {
        let generator = generator(ScriptedOracle::new().with_question("I'd rather not."));

        let first = generator.generate_question(InterviewType::Hr, 3, &[], None).await;
        let second = generator.generate_question(InterviewType::Hr, 3, &[], None).await;

        assert_eq!(first, second);
        assert_eq!(first.question, "Why should we hire you?");
        assert_eq!(first.difficulty, Difficulty::Medium);
        assert_eq!(first.expected_elements, vec!["clarity", "relevance"]);
    }

    #[tokio::test]
    async fn timeout_takes_the_same_fallback() {
        let generator = generator(ScriptedOracle::sleeping(Duration::from_secs(5)));
        let q = generator
            .generate_question(InterviewType::Behavioral, 7, &[], None)
            .await;
        assert_eq!(q, fallback(InterviewType::Behavioral, 7));
        assert_eq!(q.question, "Tell me about a conflict you faced and how you resolved it.");
    }

    #[test]
    fn prompt_carries_only_question_and_score_history() {
        let history = vec![answer_with("Tell me about yourself.", 4.5, "Lacks structure")];
        let prompt = build_prompt(InterviewType::Hr, 2, &history, Some("leadership"));

        assert!(prompt.contains("Focus Area: leadership"));
        assert!(prompt.contains("Q1: Tell me about yourself."));
        assert!(prompt.contains("Score: 4.5/10"));
        assert!(!prompt.contains("Lacks structure"));
    }
}
