use thiserror::Error;

use podwatch_provider::ProviderError;

/// Errors that abort a match instead of producing a verdict.
#[derive(Debug, Error)]
pub enum MatchError {
    /// Dereferencing a constrained field failed for a reason other than
    /// the resource being invisible.
    #[error("dereferencing failed: {0}")]
    Fetch(#[from] ProviderError),
}
