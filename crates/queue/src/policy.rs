use std::time::Duration;

use crate::retry::RetryStrategy;

/// Per-job retry policy, passed at enqueue time.
///
/// # Examples
///
/// ```
/// use podwatch_queue::JobPolicy;
///
/// let policy = JobPolicy::listener_registration();
/// assert_eq!(policy.attempts, 8);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JobPolicy {
    /// Total number of attempts, including the first one.
    pub attempts: u32,
    /// Delay between attempts.
    pub backoff: RetryStrategy,
    /// Wall-clock limit on a single attempt.
    pub attempt_timeout: Duration,
}

impl JobPolicy {
    /// Eight attempts with exponential backoff from 180 seconds.
    pub fn listener_registration() -> Self {
        Self {
            attempts: 8,
            backoff: RetryStrategy::default(),
            attempt_timeout: Duration::from_secs(60),
        }
    }

    /// A single attempt and no backoff.
    pub fn immediate() -> Self {
        Self {
            attempts: 1,
            backoff: RetryStrategy::Constant {
                delay: Duration::ZERO,
            },
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl Default for JobPolicy {
    fn default() -> Self {
        Self::listener_registration()
    }
}
