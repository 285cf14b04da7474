use std::time::Duration;

use thiserror::Error;

/// Errors from queue operations themselves.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The job payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Failure of a single processing attempt.
#[derive(Debug, Error)]
pub enum JobError {
    /// The processor failed the job. Another attempt may succeed.
    #[error("{0}")]
    Failed(String),

    /// The processor failed the job and no later attempt can succeed.
    #[error("{0}")]
    Permanent(String),

    /// The attempt ran past the policy's timeout.
    #[error("attempt timed out after {0:?}")]
    Timeout(Duration),

    /// The payload did not decode into what the processor expects.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl JobError {
    /// Returns `true` if the job should be attempted again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Failed(_) | Self::Timeout(_))
    }
}
