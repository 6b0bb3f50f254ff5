use anyhow::{anyhow, Context, Result};
use std::env;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

#[derive(Debug, Clone)]
pub struct OracleConfig {
    pub api_base: String,
    pub api_key: Option<String>,
    pub question_model: String,
    pub evaluation_model: String,
    pub feedback_model: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_expiry_minutes: i64,
    pub bind_addr: String,
    pub cors_origin: String,
    pub admin_email: String,
    pub admin_password: Option<String>,
    pub stale_session_days: i64,
    pub oracle: OracleConfig,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" => StoreBackend::Postgres,
            "memory" => StoreBackend::Memory,
            other => return Err(anyhow!("Unknown STORE_BACKEND '{}'", other)),
        };

        let database_url = env::var("DATABASE_URL").ok();
        if store_backend == StoreBackend::Postgres && database_url.is_none() {
            return Err(anyhow!("DATABASE_URL must be set for the postgres store"));
        }

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let oracle = OracleConfig {
            api_base: env::var("ORACLE_API_BASE")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            api_key: env::var("ORACLE_API_KEY").ok().filter(|key| !key.is_empty()),
            question_model: env::var("ORACLE_QUESTION_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            evaluation_model: env::var("ORACLE_EVALUATION_MODEL")
                .unwrap_or_else(|_| "gpt-4o".to_string()),
            feedback_model: env::var("ORACLE_FEEDBACK_MODEL").unwrap_or_else(|_| "gpt-4o".to_string()),
            timeout: Duration::from_secs(parse_var("ORACLE_TIMEOUT_SECS", 30)?),
        };

        Ok(Self {
            store_backend,
            database_url,
            database_max_connections: parse_var("DATABASE_MAX_CONNECTIONS", 10)?,
            jwt_secret,
            jwt_expiry_minutes: parse_var("JWT_EXPIRY_MINUTES", 60 * 24 * 7)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string()),
            cors_origin: env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@interviewcoach.local".to_string()),
            admin_password: env::var("ADMIN_PASSWORD").ok().filter(|p| !p.is_empty()),
            stale_session_days: parse_var("STALE_SESSION_DAYS", 3)?,
            oracle,
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Invalid value for {}: {}", key, e)),
        Err(_) => Ok(default),
    }
}
