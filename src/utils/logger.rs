use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use tracing::{error, info, warn};
use uuid::Uuid;

const SERVICE_NAME: &str = "interview-coach-backend";

#[derive(Debug)]
pub struct StructuredLogger;

impl StructuredLogger {
    pub fn log_request(&self, method: &str, path: &str, user_id: Option<Uuid>, status: u16) {
        let log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "http_request",
            "method": method,
            "path": path,
            "user_id": user_id,
            "status_code": status,
            "service": SERVICE_NAME
        });

        info!("{}", log_entry);
    }

    pub fn log_database_query(&self, query: &str, duration_ms: u128, result_count: Option<usize>) {
        let log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "database_query",
            "query_hash": format!("{:x}", md5::compute(query)),
            "query_preview": preview(query, 100),
            "duration_ms": duration_ms,
            "result_count": result_count,
            "service": SERVICE_NAME
        });

        if duration_ms > 1000 {
            warn!("Slow query detected: {}", log_entry);
        } else {
            info!("{}", log_entry);
        }
    }

    pub fn log_error(&self, error: &str, context: HashMap<String, serde_json::Value>) {
        let mut log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "error",
            "error_message": error,
            "service": SERVICE_NAME
        });

        for (key, value) in context {
            log_entry[key] = value;
        }

        error!("{}", log_entry);
    }

    pub fn log_performance_metric(&self, metric_name: &str, value: f64, tags: HashMap<String, String>) {
        let log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "performance_metric",
            "metric_name": metric_name,
            "value": value,
            "tags": tags,
            "service": SERVICE_NAME
        });

        info!("{}", log_entry);
    }

    pub fn log_business_event(
        &self,
        event_name: &str,
        user_id: Option<Uuid>,
        metadata: HashMap<String, serde_json::Value>,
    ) {
        let mut log_entry = json!({
            "timestamp": Utc::now().to_rfc3339(),
            "event_type": "business_event",
            "event_name": event_name,
            "user_id": user_id,
            "service": SERVICE_NAME
        });

        for (key, value) in metadata {
            log_entry[key] = value;
        }

        info!("{}", log_entry);
    }
}

/// Truncates on a char boundary so multi-byte text never panics.
fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub static LOGGER: StructuredLogger = StructuredLogger;

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn preview_truncates_long_queries() {
        assert_eq!(preview("SELECT 1", 100), "SELECT 1");
        assert_eq!(preview("abcdef", 3), "abc...");
        assert_eq!(preview("ééééé", 2), "éé...");
    }
}
