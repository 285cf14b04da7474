use chrono::{DateTime, Utc};
use serde::Serialize;

/// A job that exhausted its attempts or failed permanently.
///
/// Failed jobs are kept until the queue is cleaned.
#[derive(Debug, Clone, Serialize)]
pub struct FailedJob {
    pub key: String,
    pub payload: serde_json::Value,
    /// Description of the last error.
    pub error: String,
    /// Attempts made before giving up.
    pub attempts: u32,
    pub failed_at: DateTime<Utc>,
}
