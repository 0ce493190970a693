use crate::constants::DEFAULT_APP_LOG_CAPACITY;
use crate::core::errors::TripSplitError;
use crate::core::models::audit::{AppLog, LogQuery};
use crate::infrastructure::logging::LoggingService;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Bounded action log. Once full, the oldest entry is dropped for each new one;
/// per-trip audits in storage are unaffected.
#[derive(Clone)]
pub struct InMemoryLogging {
    logs: Arc<RwLock<VecDeque<AppLog>>>,
    capacity: usize,
}

impl Default for InMemoryLogging {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLogging {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_APP_LOG_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        InMemoryLogging {
            logs: Arc::new(RwLock::new(VecDeque::with_capacity(capacity.min(1024)))),
            capacity,
        }
    }
}

#[async_trait]
impl LoggingService for InMemoryLogging {
    async fn log_action(
        &self,
        action: &str,
        trip_id: Option<&str>,
        details: serde_json::Value,
        user_id: Option<u64>,
    ) -> Result<(), TripSplitError> {
        let details = serde_json::from_value(details)
            .map_err(|e| TripSplitError::LoggingError(format!("Log details for {} must be an object: {}", action, e)))?;
        info!(target: "tripsplit::actions", action, trip_id, user_id, "trip action recorded");

        let mut logs = self.logs.write().await;
        if logs.len() == self.capacity {
            logs.pop_front();
        }
        logs.push_back(AppLog {
            id: Uuid::new_v4().to_string(),
            action: action.to_string(),
            trip_id: trip_id.map(str::to_string),
            user_id,
            details,
            timestamp: chrono::Utc::now(),
        });
        Ok(())
    }

    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<AppLog>, TripSplitError> {
        let logs = self.logs.read().await;
        Ok(logs.iter().filter(|log| query.matches(log)).cloned().collect())
    }
}
