//! Retry policy for HTTP request attempts
//!
//! A [`RetryPolicy`] is a pure description: how many extra attempts a logical
//! request may make and how long to back off before each of them. The
//! request orchestrator feeds it the [`AttemptOutcome`] of every physical
//! attempt and acts on the returned [`RetryDecision`].
//!
//! Backoff is exponential without jitter:
//!
//! ```text
//! delay(i) = min(max_retry_delay, min_retry_delay * 2^(i-1))   for i > 0
//! ```

use std::time::Duration;

use thiserror::Error;

/// Errors produced when building a retry policy
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RetryPolicyError {
    /// The delay bounds are inverted
    #[error("Invalid retry configuration: min retry delay {min:?} exceeds max retry delay {max:?}")]
    InvertedDelays {
        /// Configured minimum delay
        min: Duration,
        /// Configured maximum delay
        max: Duration,
    },
}

/// What happened on one physical attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The request never produced a response
    Transport,
    /// The server answered with this status code
    Status(u16),
}

impl AttemptOutcome {
    /// Transport failures, 429 and every 5xx status are worth another try.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        match self {
            Self::Transport => true,
            Self::Status(status) => status == 429 || status >= 500,
        }
    }
}

/// Decision for whether to retry an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Make another attempt after the given backoff
    Retry(Duration),
    /// The current outcome is final
    Stop,
}

/// Retry limits for a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    min_retry_delay: Duration,
    max_retry_delay: Duration,
}

impl Default for RetryPolicy {
    /// Three retries backing off from one second up to thirty.
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_retry_delay: Duration::from_secs(1),
            max_retry_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Build a policy.
    ///
    /// # Errors
    ///
    /// Returns [`RetryPolicyError::InvertedDelays`] if `min_retry_delay` is
    /// larger than `max_retry_delay`.
    pub const fn new(
        max_retries: u32,
        min_retry_delay: Duration,
        max_retry_delay: Duration,
    ) -> Result<Self, RetryPolicyError> {
        if min_retry_delay.as_nanos() > max_retry_delay.as_nanos() {
            return Err(RetryPolicyError::InvertedDelays {
                min: min_retry_delay,
                max: max_retry_delay,
            });
        }
        Ok(Self { max_retries, min_retry_delay, max_retry_delay })
    }

    /// A policy that never retries.
    #[must_use]
    pub const fn no_retries() -> Self {
        Self { max_retries: 0, min_retry_delay: Duration::ZERO, max_retry_delay: Duration::ZERO }
    }

    /// Retries allowed after the first attempt
    #[must_use]
    pub const fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Lower backoff bound
    #[must_use]
    pub const fn min_retry_delay(&self) -> Duration {
        self.min_retry_delay
    }

    /// Upper backoff bound
    #[must_use]
    pub const fn max_retry_delay(&self) -> Duration {
        self.max_retry_delay
    }

    /// Total physical attempts a logical request may make
    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Backoff to sleep before attempt number `attempt` (zero based).
    ///
    /// The first attempt never sleeps.
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        2u32.checked_pow(attempt - 1)
            .and_then(|factor| self.min_retry_delay.checked_mul(factor))
            .map_or(self.max_retry_delay, |delay| delay.min(self.max_retry_delay))
    }

    /// Decide what to do after attempt number `attempt` (zero based) ended
    /// with `outcome`.
    #[must_use]
    pub fn decide(&self, attempt: u32, outcome: AttemptOutcome) -> RetryDecision {
        let next = attempt.saturating_add(1);
        if next >= self.max_attempts() || !outcome.is_retryable() {
            return RetryDecision::Stop;
        }
        RetryDecision::Retry(self.delay_for_attempt(next))
    }
}
