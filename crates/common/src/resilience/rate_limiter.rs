//! Token bucket rate limiting for outbound requests
//!
//! [`TokenBucket`] allows bursts up to its capacity and then refills at a
//! fixed interval. Callers either poll it with [`TokenBucket::try_acquire`]
//! or suspend on [`RateLimiter::wait`] until a token is granted or their
//! cancellation token fires.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::{Clock, SystemClock};

/// Errors produced by rate limiters
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RateLimitError {
    /// The limiter parameters are unusable
    #[error("invalid rate limiter configuration: {0}")]
    InvalidConfiguration(String),

    /// The caller gave up while waiting for a token
    #[error("rate limiter wait cancelled")]
    Cancelled,
}

/// Blocking admission control shared by every attempt of a client.
#[async_trait]
pub trait RateLimiter: Send + Sync + fmt::Debug {
    /// Wait until one request may proceed.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::Cancelled`] if `cancel` fires before a token
    /// is granted. An already cancelled token fails immediately even when
    /// tokens are available.
    async fn wait(&self, cancel: &CancellationToken) -> Result<(), RateLimitError>;
}

/// Configuration for token bucket rate limiter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBucketConfig {
    /// Maximum number of tokens the bucket can hold (burst)
    pub capacity: u64,
    /// Number of tokens to refill per interval
    pub refill_amount: u64,
    /// Time interval for token refill
    pub refill_interval: Duration,
}

impl Default for TokenBucketConfig {
    /// Four requests per second with a burst of one.
    fn default() -> Self {
        Self { capacity: 1, refill_amount: 1, refill_interval: Duration::from_millis(250) }
    }
}

impl TokenBucketConfig {
    /// Create a new configuration builder
    #[must_use]
    pub fn builder() -> TokenBucketConfigBuilder {
        TokenBucketConfigBuilder::new()
    }

    /// Configuration admitting `rate` requests per second with `burst`
    /// tokens of headroom.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::InvalidConfiguration`] if `rate` is not a
    /// positive finite number or `burst` is zero.
    pub fn per_second(rate: f64, burst: u64) -> Result<Self, RateLimitError> {
        if !rate.is_finite() || rate <= 0.0 {
            return Err(RateLimitError::InvalidConfiguration(format!(
                "rate must be a positive number, got {rate}"
            )));
        }
        let refill_interval = Duration::try_from_secs_f64(1.0 / rate)
            .map_err(|e| RateLimitError::InvalidConfiguration(e.to_string()))?;
        let config = Self { capacity: burst, refill_amount: 1, refill_interval };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::InvalidConfiguration`] describing the first
    /// offending field.
    pub fn validate(&self) -> Result<(), RateLimitError> {
        if self.capacity == 0 {
            return Err(RateLimitError::InvalidConfiguration(
                "capacity must be greater than 0".to_string(),
            ));
        }
        if self.refill_amount == 0 {
            return Err(RateLimitError::InvalidConfiguration(
                "refill_amount must be greater than 0".to_string(),
            ));
        }
        if self.refill_interval.is_zero() {
            return Err(RateLimitError::InvalidConfiguration(
                "refill_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`TokenBucketConfig`]
#[derive(Debug, Default)]
pub struct TokenBucketConfigBuilder {
    config: TokenBucketConfig,
}

impl TokenBucketConfigBuilder {
    /// Start from the default configuration
    #[must_use]
    pub fn new() -> Self {
        Self { config: TokenBucketConfig::default() }
    }

    /// Set the burst capacity
    #[must_use]
    pub const fn capacity(mut self, capacity: u64) -> Self {
        self.config.capacity = capacity;
        self
    }

    /// Set the tokens added per interval
    #[must_use]
    pub const fn refill_amount(mut self, amount: u64) -> Self {
        self.config.refill_amount = amount;
        self
    }

    /// Set the refill interval
    #[must_use]
    pub const fn refill_interval(mut self, interval: Duration) -> Self {
        self.config.refill_interval = interval;
        self
    }

    /// Validate and build
    ///
    /// # Errors
    ///
    /// See [`TokenBucketConfig::validate`].
    pub fn build(self) -> Result<TokenBucketConfig, RateLimitError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: u64,
    last_refill: Instant,
}

/// Token bucket rate limiter
///
/// Clones share the same bucket.
///
/// # Examples
///
/// ```rust
/// use synpse_common::resilience::TokenBucket;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let limiter = TokenBucket::per_second(4.0, 1)?;
///
/// assert!(limiter.try_acquire(1));
/// assert!(!limiter.try_acquire(1));
/// # Ok(())
/// # }
/// ```
pub struct TokenBucket<C: Clock = SystemClock> {
    config: TokenBucketConfig,
    state: Arc<Mutex<BucketState>>,
    clock: Arc<C>,
}

impl<C: Clock> TokenBucket<C> {
    /// Create a token bucket reading time from `clock`. The bucket starts
    /// full.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::InvalidConfiguration`] for an invalid
    /// configuration.
    pub fn with_clock(config: TokenBucketConfig, clock: C) -> Result<Self, RateLimitError> {
        config.validate()?;
        let state = BucketState { tokens: config.capacity, last_refill: clock.now() };
        Ok(Self { config, state: Arc::new(Mutex::new(state)), clock: Arc::new(clock) })
    }

    /// Configuration the bucket was built with
    pub const fn config(&self) -> &TokenBucketConfig {
        &self.config
    }

    fn refill(&self, state: &mut BucketState) {
        let now = self.clock.now();
        let elapsed = now.saturating_duration_since(state.last_refill);
        let refills = elapsed.as_nanos() / self.config.refill_interval.as_nanos();
        if refills == 0 {
            // Idle time at full capacity earns nothing
            if state.tokens >= self.config.capacity {
                state.last_refill = now;
            }
            return;
        }

        let added =
            u64::try_from(refills).unwrap_or(u64::MAX).saturating_mul(self.config.refill_amount);
        state.tokens = state.tokens.saturating_add(added).min(self.config.capacity);

        // Keep the fractional remainder of the interval unless the bucket is
        // full, in which case nothing accrues.
        let advanced = u32::try_from(refills)
            .ok()
            .and_then(|n| self.config.refill_interval.checked_mul(n))
            .and_then(|step| state.last_refill.checked_add(step));
        state.last_refill = match advanced {
            Some(at) if state.tokens < self.config.capacity => at,
            _ => now,
        };

        trace!(added, tokens = state.tokens, "refilled token bucket");
    }

    /// Try to acquire the specified number of tokens without waiting
    ///
    /// Returns `true` if tokens were acquired.
    pub fn try_acquire(&self, tokens: u64) -> bool {
        let mut state = self.state.lock();
        self.refill(&mut state);

        if state.tokens < tokens {
            debug!(available = state.tokens, requested = tokens, "rate limit: insufficient tokens");
            return false;
        }
        state.tokens -= tokens;
        true
    }

    /// Get the current number of available tokens
    pub fn available_tokens(&self) -> u64 {
        let mut state = self.state.lock();
        self.refill(&mut state);
        state.tokens
    }

    /// Time until `tokens` could be acquired, or `None` if the request
    /// exceeds the bucket capacity.
    pub fn time_until_available(&self, tokens: u64) -> Option<Duration> {
        if tokens > self.config.capacity {
            return None;
        }

        let mut state = self.state.lock();
        self.refill(&mut state);
        if state.tokens >= tokens {
            return Some(Duration::ZERO);
        }

        let deficit = tokens - state.tokens;
        let refills = deficit.div_ceil(self.config.refill_amount);
        let since_refill = self.clock.now().saturating_duration_since(state.last_refill);
        let full = u32::try_from(refills)
            .ok()
            .and_then(|n| self.config.refill_interval.checked_mul(n))
            .unwrap_or(Duration::MAX);
        Some(full.saturating_sub(since_refill))
    }

    /// Reset the limiter to full capacity
    pub fn reset(&self) {
        let mut state = self.state.lock();
        state.tokens = self.config.capacity;
        state.last_refill = self.clock.now();
    }
}

impl TokenBucket<SystemClock> {
    /// Create a token bucket with the system clock
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitError::InvalidConfiguration`] for an invalid
    /// configuration.
    pub fn new(config: TokenBucketConfig) -> Result<Self, RateLimitError> {
        Self::with_clock(config, SystemClock)
    }

    /// Bucket admitting `rate` requests per second with `burst` headroom
    ///
    /// # Errors
    ///
    /// See [`TokenBucketConfig::per_second`].
    pub fn per_second(rate: f64, burst: u64) -> Result<Self, RateLimitError> {
        Self::new(TokenBucketConfig::per_second(rate, burst)?)
    }
}

impl Default for TokenBucket<SystemClock> {
    fn default() -> Self {
        let config = TokenBucketConfig::default();
        let state = BucketState { tokens: config.capacity, last_refill: Instant::now() };
        Self { config, state: Arc::new(Mutex::new(state)), clock: Arc::new(SystemClock) }
    }
}

impl<C: Clock> Clone for TokenBucket<C> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            state: Arc::clone(&self.state),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock> fmt::Debug for TokenBucket<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBucket")
            .field("config", &self.config)
            .field("tokens", &self.state.lock().tokens)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<C: Clock> RateLimiter for TokenBucket<C> {
    async fn wait(&self, cancel: &CancellationToken) -> Result<(), RateLimitError> {
        loop {
            if cancel.is_cancelled() {
                return Err(RateLimitError::Cancelled);
            }
            if self.try_acquire(1) {
                return Ok(());
            }

            let delay = self
                .time_until_available(1)
                .unwrap_or(self.config.refill_interval)
                .max(Duration::from_millis(1));
            trace!(?delay, "waiting for rate limiter token");

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(RateLimitError::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}

/// Limiter that admits every request.
///
/// Still honours cancellation so that callers see the same failure mode as
/// with a real limiter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

#[async_trait]
impl RateLimiter for Unlimited {
    async fn wait(&self, cancel: &CancellationToken) -> Result<(), RateLimitError> {
        if cancel.is_cancelled() {
            return Err(RateLimitError::Cancelled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::MockClock;
    use super::*;

    fn bucket(capacity: u64, interval_ms: u64, clock: MockClock) -> TokenBucket<MockClock> {
        let config = TokenBucketConfig::builder()
            .capacity(capacity)
            .refill_amount(1)
            .refill_interval(Duration::from_millis(interval_ms))
            .build()
            .unwrap();
        TokenBucket::with_clock(config, clock).unwrap()
    }

    #[test]
    fn test_default_config_is_four_per_second_burst_one() {
        let config = TokenBucketConfig::default();
        assert_eq!(config, TokenBucketConfig::per_second(4.0, 1).unwrap());
    }

    #[test]
    fn test_per_second_rejects_bad_rates() {
        assert!(TokenBucketConfig::per_second(0.0, 1).is_err());
        assert!(TokenBucketConfig::per_second(-2.0, 1).is_err());
        assert!(TokenBucketConfig::per_second(f64::NAN, 1).is_err());
        assert!(TokenBucketConfig::per_second(4.0, 0).is_err());
    }

    #[test]
    fn test_token_bucket_burst_then_empty() {
        let clock = MockClock::new();
        let bucket = bucket(3, 100, clock);

        assert!(bucket.try_acquire(2));
        assert_eq!(bucket.available_tokens(), 1);
        assert!(bucket.try_acquire(1));
        assert!(!bucket.try_acquire(1));
    }

    #[test]
    fn test_token_bucket_refill_caps_at_capacity() {
        let clock = MockClock::new();
        let bucket = bucket(2, 100, clock.clone());

        assert!(bucket.try_acquire(2));
        clock.advance_millis(100);
        assert_eq!(bucket.available_tokens(), 1);

        clock.advance_millis(1_000);
        assert_eq!(bucket.available_tokens(), 2);
    }

    #[test]
    fn test_token_bucket_keeps_partial_interval() {
        let clock = MockClock::new();
        let bucket = bucket(5, 100, clock.clone());
        assert!(bucket.try_acquire(5));

        clock.advance_millis(150);
        assert_eq!(bucket.available_tokens(), 1);

        // The 50ms carried over from the previous refill count towards the
        // next token.
        clock.advance_millis(50);
        assert_eq!(bucket.available_tokens(), 2);
    }

    #[test]
    fn test_idle_full_bucket_does_not_bank_time() {
        let clock = MockClock::new();
        let bucket = bucket(1, 100, clock.clone());

        clock.advance_millis(90);
        assert!(bucket.try_acquire(1));
        assert_eq!(bucket.time_until_available(1), Some(Duration::from_millis(100)));

        clock.advance_millis(10);
        assert!(!bucket.try_acquire(1));
        clock.advance_millis(90);
        assert!(bucket.try_acquire(1));
    }

    #[test]
    fn test_time_until_available() {
        let clock = MockClock::new();
        let bucket = bucket(1, 250, clock.clone());

        assert_eq!(bucket.time_until_available(1), Some(Duration::ZERO));
        assert!(bucket.try_acquire(1));
        assert_eq!(bucket.time_until_available(1), Some(Duration::from_millis(250)));

        clock.advance_millis(100);
        assert_eq!(bucket.time_until_available(1), Some(Duration::from_millis(150)));
        assert_eq!(bucket.time_until_available(2), None);
    }

    #[test]
    fn test_reset_restores_capacity() {
        let clock = MockClock::new();
        let bucket = bucket(3, 1_000, clock);
        assert!(bucket.try_acquire(3));

        bucket.reset();

        assert_eq!(bucket.available_tokens(), 3);
    }

    #[tokio::test]
    async fn test_wait_returns_immediately_with_tokens() {
        let bucket = TokenBucket::per_second(1.0, 1).unwrap();
        let cancel = CancellationToken::new();

        tokio::time::timeout(Duration::from_millis(100), bucket.wait(&cancel))
            .await
            .expect("token should be granted without waiting")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_fails_when_already_cancelled() {
        let bucket = TokenBucket::per_second(1.0, 5).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(bucket.wait(&cancel).await, Err(RateLimitError::Cancelled));
        assert_eq!(bucket.available_tokens(), 5);
    }

    #[tokio::test]
    async fn test_wait_cancelled_while_blocked() {
        let bucket = TokenBucket::per_second(0.1, 1).unwrap();
        assert!(bucket.try_acquire(1));

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        assert_eq!(bucket.wait(&cancel).await, Err(RateLimitError::Cancelled));
    }

    #[tokio::test]
    async fn test_unlimited_honours_cancellation() {
        let cancel = CancellationToken::new();
        assert!(Unlimited.wait(&cancel).await.is_ok());

        cancel.cancel();
        assert_eq!(Unlimited.wait(&cancel).await, Err(RateLimitError::Cancelled));
    }
}
