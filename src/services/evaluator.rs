use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::models::interview::{AnswerEvaluation, InterviewType};
use crate::services::oracle::{ask, record_fallback, GenerationOracle, OracleOutcome, OraclePurpose, OracleRequest};

const SYSTEM_PROMPT: &str = "You are an expert interview evaluator. Always return valid JSON only.";

pub const FALLBACK_SCORE: f64 = 6.5;
const MIN_SCORE: f64 = 0.0;
const MAX_SCORE: f64 = 10.0;

#[derive(Debug, Deserialize)]
struct EvaluationDraft {
    score: f64,
    clarity: f64,
    confidence: f64,
    structure: f64,
    relevance: f64,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    weakness_identified: String,
    #[serde(default)]
    explainability_tags: Vec<String>,
}

impl EvaluationDraft {
    fn is_finite(&self) -> bool {
        [self.score, self.clarity, self.confidence, self.structure, self.relevance]
            .iter()
            .all(|v| v.is_finite())
    }

    fn into_evaluation(self) -> AnswerEvaluation {
        AnswerEvaluation {
            score: clamp_score(self.score),
            clarity: clamp_score(self.clarity),
            confidence: clamp_score(self.confidence),
            structure: clamp_score(self.structure),
            relevance: clamp_score(self.relevance),
            explanation: self.explanation,
            weakness_identified: self.weakness_identified.trim().to_string(),
            explainability_tags: self.explainability_tags,
        }
    }
}

pub fn clamp_score(value: f64) -> f64 {
    value.clamp(MIN_SCORE, MAX_SCORE)
}

pub fn fallback_evaluation() -> AnswerEvaluation {
    AnswerEvaluation {
        score: FALLBACK_SCORE,
        clarity: FALLBACK_SCORE,
        confidence: FALLBACK_SCORE,
        structure: FALLBACK_SCORE,
        relevance: FALLBACK_SCORE,
        explanation: "Answer provided with moderate clarity".to_string(),
        weakness_identified: "Structure and confidence".to_string(),
        explainability_tags: Vec::new(),
    }
}

#[derive(Clone)]
pub struct AnswerEvaluator {
    oracle: Arc<dyn GenerationOracle>,
    timeout: Duration,
}

impl AnswerEvaluator {
    pub fn new(oracle: Arc<dyn GenerationOracle>, timeout: Duration) -> Self {
        Self { oracle, timeout }
    }

    /// Never fails: unusable oracle output yields the neutral evaluation.
    pub async fn evaluate_answer(
        &self,
        question: &str,
        answer: &str,
        interview_type: InterviewType,
    ) -> AnswerEvaluation {
        let request = OracleRequest {
            purpose: OraclePurpose::Evaluation,
            system: SYSTEM_PROMPT.to_string(),
            prompt: build_prompt(question, answer, interview_type),
        };

        match ask::<EvaluationDraft>(self.oracle.as_ref(), &request, self.timeout).await {
            OracleOutcome::Parsed(draft) if draft.is_finite() => draft.into_evaluation(),
            OracleOutcome::Parsed(_) => {
                record_fallback(OraclePurpose::Evaluation, "non-finite score");
                fallback_evaluation()
            }
            OracleOutcome::Malformed(reason) => {
                record_fallback(OraclePurpose::Evaluation, &reason);
                fallback_evaluation()
            }
        }
    }
}

fn build_prompt(question: &str, answer: &str, interview_type: InterviewType) -> String {
    format!(
        r#"Evaluate this interview answer:

Question: {question}
Answer: {answer}
Interview Type: {kind}

Provide evaluation in ONLY valid JSON format:
{{
    "score": 7.5,
    "clarity": 8.0,
    "confidence": 7.0,
    "structure": 7.5,
    "relevance": 8.0,
    "explanation": "Brief explanation of score",
    "weakness_identified": "Main weakness",
    "explainability_tags": [
        "Low confidence due to hesitation",
        "Structure weak (no STAR method)",
        "Good relevance, poor clarity"
    ]
}}

All scores are between 0 and 10. Return ONLY the JSON object, no other text."#,
        question = question,
        answer = answer,
        kind = interview_type.as_str()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedOracle;

    fn evaluator(oracle: ScriptedOracle) -> AnswerEvaluator {
        AnswerEvaluator::new(Arc::new(oracle), Duration::from_millis(50))
    }

    #[tokio::test]
    async fn parses_a_complete_evaluation() {
        let oracle = ScriptedOracle::new().with_evaluation(
            r#"{"score":8.5,"clarity":9,"confidence":7.5,"structure":8,"relevance":9,
                "explanation":"Clear STAR answer","weakness_identified":"Pacing",
                "explainability_tags":["Good structure"]}"#,
        );
        let eval = evaluator(oracle)
            .evaluate_answer("Q", "A", InterviewType::Behavioral)
            .await;

        assert_eq!(eval.score, 8.5);
        assert_eq!(eval.clarity, 9.0);
        assert_eq!(eval.weakness_identified, "Pacing");
        assert_eq!(eval.explainability_tags, vec!["Good structure"]);
    }

    #[tokio::test]
    async fn invalid_text_yields_the_neutral_evaluation() {
        let eval = evaluator(ScriptedOracle::new().with_evaluation("great answer!!"))
            .evaluate_answer("Q", "A", InterviewType::Hr)
            .await;

        for value in [eval.score, eval.clarity, eval.confidence, eval.structure, eval.relevance] {
            assert_eq!(value, 6.5);
        }
        assert!(!eval.explanation.is_empty());
        assert_eq!(eval.weakness_identified, "Structure and confidence");
    }

    #[tokio::test]
    async fn missing_dimension_is_malformed() {
        let eval = evaluator(ScriptedOracle::new().with_evaluation(r#"{"score":9,"clarity":9}"#))
            .evaluate_answer("Q", "A", InterviewType::Technical)
            .await;
        assert_eq!(eval, fallback_evaluation());
    }

    #[tokio::test]
    async fn out_of_range_scores_are_clamped() {
        let oracle = ScriptedOracle::new().with_evaluation(
            r#"{"score":14,"clarity":-2,"confidence":10,"structure":0,"relevance":11.5,
                "explanation":"x","weakness_identified":"y"}"#,
        );
        let eval = evaluator(oracle).evaluate_answer("Q", "A", InterviewType::Hr).await;

        assert_eq!(eval.score, 10.0);
        assert_eq!(eval.clarity, 0.0);
        assert_eq!(eval.relevance, 10.0);
        assert!(eval.explainability_tags.is_empty());
    }

    #[tokio::test]
    async fn failing_oracle_still_produces_an_evaluation() {
        let eval = evaluator(ScriptedOracle::failing())
            .evaluate_answer("Q", "A", InterviewType::Hr)
            .await;
        assert_eq!(eval.score, FALLBACK_SCORE);
    }
}
