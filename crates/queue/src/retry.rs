use std::time::Duration;

/// Strategy for computing the delay before the next attempt of a job.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Exponential backoff: `base * multiplier^retry`, clamped to `max`.
    Exponential {
        /// Delay before the first retry.
        base: Duration,
        /// Upper bound on any single delay.
        max: Duration,
        /// Factor applied on each successive retry.
        multiplier: f64,
    },
    /// Constant delay between every attempt.
    Constant {
        /// Fixed delay duration.
        delay: Duration,
    },
}

impl RetryStrategy {
    /// Doubling backoff starting at `base`, never waiting more than `max`.
    pub fn exponential(base: Duration, max: Duration) -> Self {
        Self::Exponential {
            base,
            max,
            multiplier: 2.0,
        }
    }

    /// Compute the delay after the zero-based failed `retry` number.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    /// use podwatch_queue::RetryStrategy;
    ///
    /// let strategy = RetryStrategy::exponential(Duration::from_secs(180), Duration::from_secs(86_400));
    /// assert_eq!(strategy.delay_for(0), Duration::from_secs(180));
    /// assert_eq!(strategy.delay_for(2), Duration::from_secs(720));
    /// ```
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self {
            Self::Exponential {
                base,
                max,
                multiplier,
            } => {
                // Retry counts are single digits in practice, so the
                // u32 -> i32 conversion cannot wrap.
                #[allow(clippy::cast_possible_wrap)]
                let raw = base.as_secs_f64() * multiplier.powi(retry as i32);
                Duration::from_secs_f64(raw.min(max.as_secs_f64()))
            }
            Self::Constant { delay } => *delay,
        }
    }

    /// Sum of the delays a job waits through when all `attempts` fail.
    pub fn total_backoff(&self, attempts: u32) -> Duration {
        (0..attempts.saturating_sub(1)).map(|r| self.delay_for(r)).sum()
    }
}

impl Default for RetryStrategy {
    fn default() -> Self {
        Self::exponential(Duration::from_secs(180), Duration::from_secs(12 * 60 * 60))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_doubles_from_base() {
        let strategy = RetryStrategy::default();
        assert_eq!(strategy.delay_for(0), Duration::from_secs(180));
        assert_eq!(strategy.delay_for(1), Duration::from_secs(360));
        assert_eq!(strategy.delay_for(6), Duration::from_secs(180 * 64));
    }

    #[test]
    fn exponential_clamped() {
        let strategy = RetryStrategy::exponential(Duration::from_secs(1), Duration::from_secs(5));
        assert_eq!(strategy.delay_for(2), Duration::from_secs(4));
        assert_eq!(strategy.delay_for(3), Duration::from_secs(5));
        assert_eq!(strategy.delay_for(20), Duration::from_secs(5));
    }

    #[test]
    fn constant_always_same() {
        let strategy = RetryStrategy::Constant {
            delay: Duration::from_millis(250),
        };
        for retry in 0..10 {
            assert_eq!(strategy.delay_for(retry), Duration::from_millis(250));
        }
    }

    #[test]
    fn total_backoff_for_eight_attempts() {
        // 180 * (1 + 2 + 4 + 8 + 16 + 32 + 64) seconds.
        let strategy = RetryStrategy::default();
        assert_eq!(strategy.total_backoff(8), Duration::from_secs(180 * 127));
        assert_eq!(strategy.total_backoff(1), Duration::ZERO);
        assert_eq!(strategy.total_backoff(0), Duration::ZERO);
    }
}
