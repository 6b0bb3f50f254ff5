//! Text-generation backend used for questions, answer evaluations and feedback.
//!
//! The oracle only promises free text. Callers go through [`ask`], which bounds
//! the wait, normalises the text and hands back an [`OracleOutcome`]; the
//! `Malformed` arm is always answered with the caller's fixed fallback.

use async_trait::async_trait;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use thiserror::Error;

use crate::config::OracleConfig;
use crate::utils::logger::LOGGER;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OraclePurpose {
    Question,
    Evaluation,
    Feedback,
}

impl OraclePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            OraclePurpose::Question => "question_generation",
            OraclePurpose::Evaluation => "answer_evaluation",
            OraclePurpose::Feedback => "feedback_generation",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub purpose: OraclePurpose,
    pub system: String,
    pub prompt: String,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle is disabled")]
    Disabled,
    #[error("oracle request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("oracle returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("oracle returned no content")]
    EmptyResponse,
    #[error("oracle timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait GenerationOracle: Send + Sync {
    async fn generate(&self, request: &OracleRequest) -> Result<String, OracleError>;
}

#[derive(Debug)]
pub enum OracleOutcome<T> {
    Parsed(T),
    /// Raw text or failure reason; never surfaced past the calling component.
    Malformed(String),
}

pub async fn ask<T: DeserializeOwned>(
    oracle: &dyn GenerationOracle,
    request: &OracleRequest,
    limit: Duration,
) -> OracleOutcome<T> {
    let raw = match tokio::time::timeout(limit, oracle.generate(request)).await {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => return OracleOutcome::Malformed(err.to_string()),
        Err(_) => return OracleOutcome::Malformed(OracleError::Timeout(limit).to_string()),
    };

    match parse_json_object(&raw) {
        Some(value) => OracleOutcome::Parsed(value),
        None => OracleOutcome::Malformed(raw),
    }
}

/// Records that an operation answered with its fallback value.
pub fn record_fallback(purpose: OraclePurpose, reason: &str) {
    let reason: String = reason.chars().take(200).collect();
    LOGGER.log_business_event(
        "oracle_fallback_used",
        None,
        [
            ("operation".to_string(), json!(purpose.as_str())),
            ("reason".to_string(), json!(reason)),
        ]
        .iter()
        .cloned()
        .collect(),
    );
}

fn object_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("object pattern is valid"))
}

/// Accepts a bare object, a fenced Markdown block, or an object wrapped in prose.
pub fn parse_json_object<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let mut text = raw.trim();
    if let Some(inner) = text.strip_prefix("```") {
        let inner = inner.strip_prefix("json").unwrap_or(inner);
        text = inner.strip_suffix("```").unwrap_or(inner).trim();
    }

    if let Ok(value) = serde_json::from_str(text) {
        return Some(value);
    }

    let candidate = object_pattern().find(text)?;
    serde_json::from_str(candidate.as_str()).ok()
}

pub struct OpenAiOracle {
    client: reqwest::Client,
    api_key: String,
    config: OracleConfig,
}

impl OpenAiOracle {
    pub fn new(api_key: String, config: OracleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            config,
        }
    }

    fn model_for(&self, purpose: OraclePurpose) -> &str {
        match purpose {
            OraclePurpose::Question => &self.config.question_model,
            OraclePurpose::Evaluation => &self.config.evaluation_model,
            OraclePurpose::Feedback => &self.config.feedback_model,
        }
    }
}

#[async_trait]
impl GenerationOracle for OpenAiOracle {
    async fn generate(&self, request: &OracleRequest) -> Result<String, OracleError> {
        let payload = json!({
            "model": self.model_for(request.purpose),
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": request.prompt }
            ],
            "response_format": { "type": "json_object" }
        });

        let res = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base.trim_end_matches('/')))
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            return Err(OracleError::Status { status, body });
        }

        let body: serde_json::Value = res.json().await?;
        body.get("choices")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.as_str())
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string)
            .ok_or(OracleError::EmptyResponse)
    }
}

/// Used when no API key is configured; every operation takes its fallback.
#[derive(Debug, Default)]
pub struct DisabledOracle;

#[async_trait]
impl GenerationOracle for DisabledOracle {
    async fn generate(&self, _request: &OracleRequest) -> Result<String, OracleError> {
        Err(OracleError::Disabled)
    }
}

pub fn build_oracle(config: &OracleConfig) -> Arc<dyn GenerationOracle> {
    match &config.api_key {
        Some(key) => Arc::new(OpenAiOracle::new(key.clone(), config.clone())),
        None => {
            tracing::warn!("ORACLE_API_KEY not set, interview content will use fallbacks");
            Arc::new(DisabledOracle)
        }
    }
}
