//! Reusable building blocks shared across Synpse crates.
//!
//! Nothing here knows about the Synpse API itself: these are the generic
//! policies the client composes (rate limiting, retry backoff, error
//! classification and an injectable line logger).
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: error classification
//! - `runtime`: async infrastructure (resilience, observability)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod error;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod observability;
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use error::{ErrorClassification, ErrorSeverity};
#[cfg(feature = "runtime")]
pub use observability::{Logger, NoopLogger, RecordingLogger, TracingLogger};
#[cfg(feature = "runtime")]
pub use resilience::{
    AttemptOutcome, Clock, MockClock, RateLimitError, RateLimiter, RetryDecision, RetryPolicy,
    RetryPolicyError, SystemClock, TokenBucket, TokenBucketConfig, Unlimited,
};
