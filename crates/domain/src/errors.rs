//! Error types for domain validation

use thiserror::Error;

/// Errors raised while parsing or validating domain values
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A string did not name any variant of a wire enum
    #[error("Invalid {kind}: {value}")]
    InvalidValue {
        /// Type being parsed
        kind: &'static str,
        /// Offending input
        value: String,
    },

    /// Client settings are inconsistent
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias for domain operations
pub type Result<T> = std::result::Result<T, DomainError>;
