//! Client settings
//!
//! Plain data describing how a client should be built. Loaded from
//! environment variables or a TOML/JSON file by `synpse-infra`, then turned
//! into a live client. Durations are stored as milliseconds so that both
//! file formats stay flat.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_URL, DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_DELAY_MS, DEFAULT_MIN_RETRY_DELAY_MS,
    DEFAULT_RATE_LIMIT_BURST, DEFAULT_REQUESTS_PER_SECOND, DEFAULT_USER_AGENT,
};
use crate::errors::{DomainError, Result};

/// Retry limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub min_retry_delay_ms: u64,
    pub max_retry_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            min_retry_delay_ms: DEFAULT_MIN_RETRY_DELAY_MS,
            max_retry_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
        }
    }
}

impl RetrySettings {
    pub const fn min_retry_delay(&self) -> Duration {
        Duration::from_millis(self.min_retry_delay_ms)
    }

    pub const fn max_retry_delay(&self) -> Duration {
        Duration::from_millis(self.max_retry_delay_ms)
    }
}

/// Client-side request rate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    pub requests_per_second: f64,
    pub burst: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self { requests_per_second: DEFAULT_REQUESTS_PER_SECOND, burst: DEFAULT_RATE_LIMIT_BURST }
    }
}

/// Everything needed to construct a client.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub api_url: String,
    pub access_key: String,
    pub project_id: Option<String>,
    pub user_agent: String,
    /// Per-attempt HTTP timeout; unset means no client-side timeout
    pub request_timeout_ms: Option<u64>,
    /// Headers added to every request
    pub headers: BTreeMap<String, String>,
    pub retry: RetrySettings,
    pub rate_limit: RateLimitSettings,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            access_key: String::new(),
            project_id: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_ms: None,
            headers: BTreeMap::new(),
            retry: RetrySettings::default(),
            rate_limit: RateLimitSettings::default(),
        }
    }
}

// The access key never appears in logs.
impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("api_url", &self.api_url)
            .field("access_key", &if self.access_key.is_empty() { "<empty>" } else { "<redacted>" })
            .field("project_id", &self.project_id)
            .field("user_agent", &self.user_agent)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("headers", &self.headers.keys().collect::<Vec<_>>())
            .field("retry", &self.retry)
            .field("rate_limit", &self.rate_limit)
            .finish()
    }
}

impl ClientSettings {
    /// Settings for `access_key` with every other field at its default
    pub fn with_access_key(access_key: impl Into<String>) -> Self {
        Self { access_key: access_key.into(), ..Self::default() }
    }

    /// Per-attempt timeout as a duration
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Check internal consistency.
    ///
    /// An empty access key is accepted here; the client constructor reports
    /// it as a credentials error.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::Config`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(DomainError::Config("api_url must not be empty".to_string()));
        }
        if self.retry.min_retry_delay_ms > self.retry.max_retry_delay_ms {
            return Err(DomainError::Config(format!(
                "retry.min_retry_delay_ms ({}) exceeds retry.max_retry_delay_ms ({})",
                self.retry.min_retry_delay_ms, self.retry.max_retry_delay_ms
            )));
        }
        if !self.rate_limit.requests_per_second.is_finite()
            || self.rate_limit.requests_per_second <= 0.0
        {
            return Err(DomainError::Config(
                "rate_limit.requests_per_second must be positive".to_string(),
            ));
        }
        if self.rate_limit.burst == 0 {
            return Err(DomainError::Config("rate_limit.burst must be at least 1".to_string()));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(DomainError::Config("request_timeout_ms must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_public_api() {
        let settings = ClientSettings::default();
        assert_eq!(settings.api_url, "https://cloud.synpse.net/api");
        assert_eq!(settings.user_agent, "synpse-rs/v1");
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.retry.min_retry_delay(), Duration::from_secs(1));
        assert_eq!(settings.retry.max_retry_delay(), Duration::from_secs(30));
        assert!((settings.rate_limit.requests_per_second - 4.0).abs() < f64::EPSILON);
        assert_eq!(settings.rate_limit.burst, 1);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let settings: ClientSettings =
            serde_json::from_str(r#"{"access_key":"k","retry":{"max_retries":7}}"#).unwrap();

        assert_eq!(settings.access_key, "k");
        assert_eq!(settings.retry.max_retries, 7);
        assert_eq!(settings.retry.min_retry_delay_ms, 1_000);
        assert_eq!(settings.api_url, "https://cloud.synpse.net/api");
    }

    #[test]
    fn test_validate_rejects_inverted_delays() {
        let mut settings = ClientSettings::with_access_key("k");
        settings.retry.min_retry_delay_ms = 5_000;
        settings.retry.max_retry_delay_ms = 100;

        let err = settings.validate().unwrap_err();
        assert!(err.to_string().contains("min_retry_delay_ms"));
    }

    #[test]
    fn test_validate_rejects_bad_rate_limit() {
        let mut settings = ClientSettings::with_access_key("k");
        settings.rate_limit.requests_per_second = 0.0;
        assert!(settings.validate().is_err());

        settings.rate_limit.requests_per_second = 2.0;
        settings.rate_limit.burst = 0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_access_key() {
        let settings = ClientSettings::with_access_key("super-secret");
        let rendered = format!("{settings:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
