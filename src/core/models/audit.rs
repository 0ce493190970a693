use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Application wide action log.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppLog {
    pub id: String,
    pub action: String,
    pub trip_id: Option<String>,
    pub user_id: Option<u64>,
    pub details: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Per-trip audit trail, kept with the trip's records.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TripAudit {
    pub id: String,
    pub trip_id: String,
    pub action: String,
    pub user_id: Option<u64>,
    pub details: HashMap<String, serde_json::Value>,
    pub timestamp: DateTime<Utc>,
}

/// Narrows the application log. Unset fields match everything.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct LogQuery {
    pub trip_id: Option<String>,
    pub action: Option<String>,
    pub user_id: Option<u64>,
}

impl LogQuery {
    pub fn matches(&self, log: &AppLog) -> bool {
        self.trip_id.as_ref().is_none_or(|id| log.trip_id.as_ref() == Some(id))
            && self.action.as_ref().is_none_or(|action| &log.action == action)
            && self.user_id.is_none_or(|user_id| log.user_id == Some(user_id))
    }
}
