pub mod in_memory;

use crate::core::errors::TripSplitError;
use crate::core::models::audit::{AppLog, LogQuery};
use async_trait::async_trait;

#[async_trait]
pub trait LoggingService: Send + Sync {
    async fn log_action(
        &self,
        action: &str,
        trip_id: Option<&str>,
        details: serde_json::Value,
        user_id: Option<u64>,
    ) -> Result<(), TripSplitError>;
    /// Oldest first.
    async fn get_logs(&self, query: &LogQuery) -> Result<Vec<AppLog>, TripSplitError>;
}
