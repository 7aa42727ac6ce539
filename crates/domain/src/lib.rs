//! # Synpse Domain
//!
//! Payload types and models for the Synpse fleet management API.
//!
//! This crate contains:
//! - Resource payloads (projects, namespaces, devices, applications, jobs,
//!   secrets, registration tokens) as exchanged with the API
//! - Pagination model and its wire names
//! - Client settings structure
//! - Domain error types and constants
//!
//! ## Architecture
//! - No dependencies on other Synpse crates
//! - No I/O: everything here is plain data plus serde

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod pagination;
pub mod types;

// Re-export commonly used items
pub use config::{ClientSettings, RateLimitSettings, RetrySettings};
pub use errors::{DomainError, Result};
pub use pagination::{Pagination, PaginationOptions};
pub use types::*;
