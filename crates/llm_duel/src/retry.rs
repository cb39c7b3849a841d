//! Fixed-delay retry budget for one party's turn.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// How often, and how far apart, a party is re-solicited after a bad attempt.
///
/// The delay is fixed rather than exponential: the budget is small and a
/// growing backoff would stall a live game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay_between_attempts: Duration,
}

impl RetryPolicy {
    /// Attempts per turn unless configured otherwise.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Pause between attempts unless configured otherwise.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(30);

    /// Creates a policy. A turn always gets at least one attempt.
    #[instrument]
    pub fn new(max_attempts: u32, delay_between_attempts: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay_between_attempts,
        }
    }

    /// Maximum solicitations per turn.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Pause inserted before each re-solicitation.
    pub fn delay_between_attempts(&self) -> Duration {
        self.delay_between_attempts
    }

    /// True while `attempt` (1-based, just failed) leaves budget for another.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Suspends the calling turn for the configured delay.
    ///
    /// Cancel-safe: dropping the future abandons the wait.
    #[instrument(skip(self), fields(delay = ?self.delay_between_attempts))]
    pub async fn wait_before_retry(&self) {
        debug!("Waiting before retry");
        tokio::time::sleep(self.delay_between_attempts).await;
    }

    /// Worst-case wall time of a turn: every attempt running to
    /// `call_timeout`, plus every delay between them.
    pub fn turn_budget(&self, call_timeout: Duration) -> Duration {
        call_timeout
            .saturating_mul(self.max_attempts)
            .saturating_add(
                self.delay_between_attempts
                    .saturating_mul(self.max_attempts - 1),
            )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}
