//! Bounded retry with exponential backoff.

use std::time::Duration;

use mend_core::AdapterConfig;

/// Upper bound on any single backoff delay.
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// How often, and how patiently, a failed call is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first, at least 1
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: MAX_BACKOFF,
        }
    }

    /// Up to `max_attempts` attempts, doubling the delay after each failure.
    pub fn exponential(max_attempts: u32, initial_backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff: MAX_BACKOFF,
        }
    }

    pub fn with_max_backoff(mut self, max_backoff: Duration) -> Self {
        self.max_backoff = max_backoff;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_backoff
            .saturating_mul(1u32 << exponent)
            .min(self.max_backoff)
    }
}

impl From<&AdapterConfig> for RetryPolicy {
    fn from(config: &AdapterConfig) -> Self {
        Self::exponential(config.max_attempts, config.backoff())
    }
}
