//! Resilience patterns for outbound API traffic
//!
//! This module provides **generic, reusable** building blocks used by the
//! request orchestrator:
//! - **Rate Limiting**: a token bucket shared by every attempt of a client,
//!   with a cancellable async wait
//! - **Retry Policy**: attempt limits plus a capped exponential backoff
//!   schedule, and the classification of which outcomes are retryable
//! - **Clock**: time abstraction so limiters can be tested without sleeping
//!
//! None of these types perform I/O. The orchestrator in `synpse-infra`
//! decides when to wait, sleep and retry.

pub mod clock;
pub mod rate_limiter;
pub mod retry;

pub use clock::{Clock, MockClock, SystemClock};
pub use rate_limiter::{
    RateLimitError, RateLimiter, TokenBucket, TokenBucketConfig, TokenBucketConfigBuilder,
    Unlimited,
};
pub use retry::{AttemptOutcome, RetryDecision, RetryPolicy, RetryPolicyError};
