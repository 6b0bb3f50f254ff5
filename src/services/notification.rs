use anyhow::Result;
use chrono::{Duration, Utc};
use serde::Serialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{interview::InterviewSession, user::User};
use crate::store::InterviewStore;
use crate::utils::logger::LOGGER;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReminderReport {
    pub processed_users: usize,
    pub total_stale_sessions: usize,
}

/// Nudges candidates who left a session unfinished.
pub struct NotificationService {
    store: Arc<dyn InterviewStore>,
}

impl NotificationService {
    pub fn new(store: Arc<dyn InterviewStore>) -> Self {
        Self { store }
    }

    pub async fn find_stale_sessions(&self, days: i64) -> Result<Vec<InterviewSession>> {
        let cutoff = Utc::now() - Duration::days(days);
        Ok(self.store.list_stale_interviews(cutoff).await?)
    }

    pub async fn send_reminder(&self, user: &User, sessions: &[InterviewSession]) -> Result<()> {
        // Delivery is a log event; an email or push channel would hook in here.
        LOGGER.log_business_event(
            "stale_session_reminder",
            Some(user.id),
            [
                ("email".to_string(), json!(user.email)),
                ("stale_sessions".to_string(), json!(sessions.len())),
                (
                    "interview_ids".to_string(),
                    json!(sessions.iter().map(|s| s.id).collect::<Vec<_>>()),
                ),
            ]
            .iter()
            .cloned()
            .collect(),
        );
        Ok(())
    }

    pub async fn process_stale_sessions(&self, days: i64) -> Result<ReminderReport> {
        let stale = self.find_stale_sessions(days).await?;
        let total_stale_sessions = stale.len();

        let mut by_user: HashMap<Uuid, Vec<InterviewSession>> = HashMap::new();
        for session in stale {
            by_user.entry(session.user_id).or_default().push(session);
        }

        let mut processed_users = 0;
        for (user_id, sessions) in by_user {
            let user = match self.store.find_user(user_id).await? {
                Some(user) => user,
                None => {
                    tracing::warn!("Stale sessions reference missing user {}", user_id);
                    continue;
                }
            };

            if let Err(e) = self.send_reminder(&user, &sessions).await {
                tracing::error!("Failed to send reminder to {}: {}", user.email, e);
                continue;
            }
            processed_users += 1;
        }

        Ok(ReminderReport {
            processed_users,
            total_stale_sessions,
        })
    }
}
