//! API-specific error types
//!
//! Maps terminal HTTP statuses onto typed variants and provides error
//! classification for callers that want to decide on retries themselves.

use std::time::Duration;

use bytes::Bytes;
use reqwest::StatusCode;
use synpse_common::error::{ErrorClassification, ErrorSeverity};
use synpse_domain::DomainError;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

use crate::ssh::SshError;

/// Categories of API errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorCategory {
    /// Credentials missing, rejected or lacking permissions (401, 403)
    Authentication,
    /// Precondition or subscription limits (412, 402)
    Precondition,
    /// Server-side failures (5xx, gateway statuses)
    Server,
    /// Request rejected as invalid or not found (4xx)
    Client,
    /// Connection-level failures, including tunnels
    Network,
    /// Client misconfiguration or invalid arguments
    Config,
    /// Payload encoding or decoding
    Payload,
    /// The caller gave up
    Cancelled,
}

/// API operation errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("error performing request: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("error caused by request rate limiting: wait cancelled")]
    RateLimitWaitCancelled,

    #[error("request cancelled")]
    Cancelled,

    #[error("HTTP status {status}: invalid credentials")]
    Unauthorized { status: u16 },

    #[error("HTTP status {status}: insufficient permissions")]
    Forbidden { status: u16 },

    #[error("HTTP status {status}: precondition failed")]
    PreconditionFailed { status: u16 },

    #[error("HTTP status {status}: feature not available for your subscription")]
    PaymentRequired { status: u16 },

    #[error("HTTP status {status}: service failure")]
    ServiceUnavailable { status: u16 },

    /// Server-side validation message, verbatim
    #[error("{0}")]
    BadRequest(String),

    #[error("HTTP status {status}: content {body:?}")]
    Status { status: u16, body: String },

    #[error("error unmarshalling {context}: {source}")]
    Unmarshal {
        context: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("error marshalling params to JSON: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("error connecting to the backend: {0}")]
    Tunnel(#[source] Box<tungstenite::Error>),

    #[error(transparent)]
    Ssh(#[from] SshError),
}

impl From<tungstenite::Error> for ApiError {
    fn from(err: tungstenite::Error) -> Self {
        Self::Tunnel(Box::new(err))
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Config(err.to_string())
    }
}

impl ApiError {
    /// Message used when a client is built without an access key
    pub const EMPTY_CREDENTIALS: &'static str =
        "invalid credentials: access key must not be empty";

    /// Message used when a namespaced call gets an empty namespace
    pub const NAMESPACE_NOT_SPECIFIED: &'static str = "namespace not specified";

    /// Message used when a call on one application gets an empty name
    pub const APPLICATION_NOT_SELECTED: &'static str = "application name or ID not selected";

    /// Message used when a call on one job gets an empty name or ID
    pub const JOB_NOT_SELECTED: &'static str = "name or ID not selected";

    /// Classify a terminal response.
    ///
    /// Returns `None` for 2xx statuses.
    #[must_use]
    pub fn from_status(status: StatusCode, body: &Bytes) -> Option<Self> {
        let code = status.as_u16();
        let err = match code {
            200..=299 => return None,
            401 => Self::Unauthorized { status: code },
            403 => Self::Forbidden { status: code },
            412 => Self::PreconditionFailed { status: code },
            402 => Self::PaymentRequired { status: code },
            502 | 503 | 504 | 522 | 523 | 524 => Self::ServiceUnavailable { status: code },
            400 => Self::BadRequest(String::from_utf8_lossy(body).into_owned()),
            _ => Self::Status { status: code, body: String::from_utf8_lossy(body).into_owned() },
        };
        Some(err)
    }

    pub fn namespace_not_specified() -> Self {
        Self::InvalidArgument(Self::NAMESPACE_NOT_SPECIFIED.to_string())
    }

    /// HTTP status behind this error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { status }
            | Self::Forbidden { status }
            | Self::PreconditionFailed { status }
            | Self::PaymentRequired { status }
            | Self::ServiceUnavailable { status }
            | Self::Status { status, .. } => Some(*status),
            Self::BadRequest(_) => Some(400),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Get the error category for this error
    pub fn category(&self) -> ApiErrorCategory {
        match self {
            Self::Unauthorized { .. } | Self::Forbidden { .. } => ApiErrorCategory::Authentication,
            Self::PreconditionFailed { .. } | Self::PaymentRequired { .. } => {
                ApiErrorCategory::Precondition
            }
            Self::ServiceUnavailable { .. } => ApiErrorCategory::Server,
            Self::Status { status, .. } if *status >= 500 => ApiErrorCategory::Server,
            Self::BadRequest(_) | Self::Status { .. } => ApiErrorCategory::Client,
            Self::Transport(_) | Self::Tunnel(_) | Self::Ssh(_) => ApiErrorCategory::Network,
            Self::Config(_) | Self::InvalidArgument(_) | Self::InvalidUrl(_) => {
                ApiErrorCategory::Config
            }
            Self::Unmarshal { .. } | Self::Serialize(_) => ApiErrorCategory::Payload,
            Self::RateLimitWaitCancelled | Self::Cancelled => ApiErrorCategory::Cancelled,
        }
    }
}

impl ErrorClassification for ApiError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            _ => matches!(self.category(), ApiErrorCategory::Server | ApiErrorCategory::Network),
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ApiErrorCategory::Cancelled | ApiErrorCategory::Client => ErrorSeverity::Info,
            ApiErrorCategory::Server | ApiErrorCategory::Precondition => ErrorSeverity::Warning,
            ApiErrorCategory::Authentication
            | ApiErrorCategory::Network
            | ApiErrorCategory::Config => ErrorSeverity::Error,
            ApiErrorCategory::Payload => ErrorSeverity::Critical,
        }
    }

    fn is_critical(&self) -> bool {
        matches!(self.category(), ApiErrorCategory::Payload)
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
