//! Integration tests for resilience module
//!
//! Exercises the token bucket under real time and concurrent waiters, and the
//! retry schedule as seen by a caller driving attempts.

#![cfg(feature = "runtime")]

use std::sync::Arc;
use std::time::{Duration, Instant};

use synpse_common::resilience::{
    AttemptOutcome, MockClock, RateLimiter, RetryDecision, RetryPolicy, TokenBucket,
    TokenBucketConfig,
};
use tokio_util::sync::CancellationToken;

/// Validates that a limiter at rate R with burst B admits B requests at once
/// and spaces the following K requests over at least K/R seconds.
///
/// # Test Steps
/// 1. Build a bucket at 20 requests/second with burst 2
/// 2. Wait for 2 + 4 tokens sequentially
/// 3. Verify elapsed time is at least 4/20 seconds
#[tokio::test(flavor = "multi_thread")]
async fn test_burst_then_steady_rate() {
    let limiter = TokenBucket::per_second(20.0, 2).expect("valid limiter");
    let cancel = CancellationToken::new();

    let started = Instant::now();
    for _ in 0..6 {
        limiter.wait(&cancel).await.expect("token granted");
    }
    let elapsed = started.elapsed();

    assert!(elapsed >= Duration::from_millis(200), "elapsed {elapsed:?} shorter than 4/R");
}

/// Validates that concurrent waiters on a shared limiter never exceed the
/// configured rate in aggregate.
///
/// # Test Steps
/// 1. Share one bucket at 25 requests/second, burst 1, across 5 tasks
/// 2. Each task acquires one token
/// 3. Verify the last grant happens at least 4/25 seconds after the start
#[tokio::test(flavor = "multi_thread")]
async fn test_concurrent_waiters_share_rate() {
    let limiter: Arc<dyn RateLimiter> =
        Arc::new(TokenBucket::per_second(25.0, 1).expect("valid limiter"));
    let cancel = CancellationToken::new();

    let started = Instant::now();
    let mut handles = Vec::new();
    for _ in 0..5 {
        let limiter = Arc::clone(&limiter);
        let cancel = cancel.clone();
        handles.push(tokio::spawn(async move { limiter.wait(&cancel).await }));
    }
    for handle in handles {
        handle.await.expect("task joins").expect("token granted");
    }

    assert!(started.elapsed() >= Duration::from_millis(160), "{:?}", started.elapsed());
}

/// Validates that a mock clock drives refill without real sleeps.
#[test]
fn test_mock_clock_refill_matches_rate() {
    let clock = MockClock::new();
    let limiter = TokenBucket::with_clock(
        TokenBucketConfig::per_second(4.0, 1).expect("valid config"),
        clock.clone(),
    )
    .expect("valid limiter");

    assert!(limiter.try_acquire(1));
    assert!(!limiter.try_acquire(1));

    clock.advance_millis(249);
    assert!(!limiter.try_acquire(1));

    clock.advance_millis(1);
    assert!(limiter.try_acquire(1));
}

/// Validates the full decision sequence for a request that keeps failing
/// with a server error.
///
/// # Test Steps
/// 1. Use the default policy (3 retries, 1s..30s)
/// 2. Feed a 503 outcome for every attempt
/// 3. Verify exactly four attempts are allowed with 1s, 2s, 4s backoff
#[test]
fn test_retry_sequence_for_persistent_server_error() {
    let policy = RetryPolicy::default();
    let mut attempt = 0;
    let mut delays = Vec::new();

    while let RetryDecision::Retry(delay) = policy.decide(attempt, AttemptOutcome::Status(503)) {
        delays.push(delay);
        attempt += 1;
    }

    assert_eq!(attempt + 1, 4);
    assert_eq!(
        delays,
        vec![Duration::from_secs(1), Duration::from_secs(2), Duration::from_secs(4)]
    );
}
