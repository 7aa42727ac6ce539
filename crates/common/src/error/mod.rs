//! Error classification shared across Synpse crates
//!
//! Every error type that crosses a crate boundary implements
//! [`ErrorClassification`] so callers can make uniform decisions about
//! retrying, alerting and logging without matching on concrete variants.
//!
//! ## ErrorSeverity Levels
//!
//! | Level | Use Case | Examples |
//! |-------|----------|----------|
//! | **Info** | Expected conditions | Caller cancelled, validation rejected by server |
//! | **Warning** | Degraded but operational | Rate limiting, transient service failure |
//! | **Error** | Failure requiring attention | Network errors, invalid credentials, bad config |
//! | **Critical** | Client integrity at risk | Response payloads that no longer decode |
//!
//! ## Implementing
//!
//! ```rust
//! use std::time::Duration;
//!
//! use synpse_common::error::{ErrorClassification, ErrorSeverity};
//!
//! #[derive(Debug)]
//! enum WidgetError {
//!     Busy,
//!     Missing,
//! }
//!
//! impl ErrorClassification for WidgetError {
//!     fn is_retryable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//!
//!     fn severity(&self) -> ErrorSeverity {
//!         match self {
//!             Self::Busy => ErrorSeverity::Warning,
//!             Self::Missing => ErrorSeverity::Info,
//!         }
//!     }
//!
//!     fn is_critical(&self) -> bool {
//!         false
//!     }
//!
//!     fn retry_after(&self) -> Option<Duration> {
//!         None
//!     }
//! }
//!
//! assert!(WidgetError::Busy.is_retryable());
//! assert_eq!(WidgetError::Missing.severity(), ErrorSeverity::Info);
//! ```

use std::fmt;
use std::time::Duration;

/// Standard interface for classifying errors by their characteristics
pub trait ErrorClassification {
    /// Check if this error is retryable
    ///
    /// Retryable errors are transient issues that may succeed if attempted
    /// again, such as network failures or temporary service unavailability.
    fn is_retryable(&self) -> bool;

    /// Get the error severity level
    fn severity(&self) -> ErrorSeverity;

    /// Check if this is a critical error requiring immediate attention
    fn is_critical(&self) -> bool;

    /// Get the suggested retry delay if applicable
    fn retry_after(&self) -> Option<Duration>;
}

/// Error severity levels for monitoring and alerting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// Informational, typically for debugging
    Info,
    /// Warning, should be monitored but not critical
    Warning,
    /// Error, requires attention and action
    Error,
    /// Critical, immediate action required
    Critical,
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARN"),
            Self::Error => write!(f, "ERROR"),
            Self::Critical => write!(f, "CRITICAL"),
        }
    }
}
