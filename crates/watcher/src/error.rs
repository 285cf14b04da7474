use thiserror::Error;

/// Errors surfaced by the watcher.
#[derive(Debug, Error)]
pub enum WatcherError {
    /// A collaborator call failed.
    #[error("provider error: {0}")]
    Provider(#[from] podwatch_provider::ProviderError),

    /// Dereferencing during a match failed.
    #[error("match error: {0}")]
    Match(#[from] podwatch_matcher::MatchError),

    /// The job queue failed.
    #[error("queue error: {0}")]
    Queue(#[from] podwatch_queue::QueueError),

    /// An incoming event or grant was malformed.
    #[error("invalid data: {0}")]
    Invalid(#[from] podwatch_core::PodwatchError),

    /// The watcher was misconfigured (e.g. missing required collaborators).
    #[error("configuration error: {0}")]
    Configuration(String),
}
