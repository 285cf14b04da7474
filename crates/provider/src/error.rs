use std::time::Duration;

use thiserror::Error;

/// Errors returned by the collaborators this crate talks to.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The collaborator answered with an HTTP-equivalent error status.
    #[error("status {status}: {message}")]
    Status { status: u16, message: String },

    /// The requested resource or actor does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The collaborator failed to carry out the call.
    #[error("execution failed: {0}")]
    ExecutionFailed(String),

    /// The collaborator did not respond within the allowed duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The collaborator was given invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl ProviderError {
    /// Shorthand for a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Returns `true` when the error means the resource is not visible to
    /// the acting identity (401, 403, 404).
    pub fn is_denial(&self) -> bool {
        match self {
            Self::Status { status, .. } => matches!(status, 401 | 403 | 404),
            Self::NotFound(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if the error is transient and the operation may succeed
    /// on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Connection(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denial_statuses() {
        assert!(ProviderError::status(401, "unauthorized").is_denial());
        assert!(ProviderError::status(403, "forbidden").is_denial());
        assert!(ProviderError::status(404, "gone").is_denial());
        assert!(ProviderError::NotFound("x".into()).is_denial());
        assert!(!ProviderError::status(500, "boom").is_denial());
        assert!(!ProviderError::Connection("reset".into()).is_denial());
    }

    #[test]
    fn retryable_errors() {
        assert!(ProviderError::Timeout(Duration::from_secs(5)).is_retryable());
        assert!(ProviderError::Connection("reset".into()).is_retryable());
        assert!(ProviderError::status(503, "unavailable").is_retryable());
        assert!(ProviderError::status(429, "slow down").is_retryable());
        assert!(!ProviderError::status(403, "forbidden").is_retryable());
        assert!(!ProviderError::Configuration("x".into()).is_retryable());
    }

    #[test]
    fn error_display() {
        let err = ProviderError::status(403, "forbidden");
        assert_eq!(err.to_string(), "status 403: forbidden");

        let err = ProviderError::Timeout(Duration::from_millis(500));
        assert_eq!(err.to_string(), "timeout after 500ms");
    }
}
