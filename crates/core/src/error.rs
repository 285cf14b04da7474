use thiserror::Error;

/// Errors raised while interpreting domain data received from collaborators.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PodwatchError {
    /// An access grant row was missing a field or carried an unusable value.
    #[error("invalid access grant: {0}")]
    InvalidGrant(String),

    /// A URI could not be decomposed (e.g. it has no parent container).
    #[error("invalid uri: {0}")]
    InvalidUri(String),

    /// A collection name other than `inbox` or `outbox`.
    #[error("unknown collection: {0}")]
    UnknownCollection(String),
}
