//! Synpse API client
//!
//! # Architecture
//!
//! - [`ApiClient`]: one logical request at a time, with rate limiting,
//!   retries, basic auth and status classification
//! - [`ApiCommands`]: typed resource operations on top of the client
//! - [`RequestContext`]: caller-driven cancellation and deadlines
//!
//! Device tunnels and SSH sessions are opened through the same client; see
//! [`crate::tunnel`] and [`crate::ssh`].

pub mod client;
pub mod commands;
pub mod context;
pub mod errors;

pub use client::{ApiClient, ApiClientBuilder};
pub use commands::{ApiCommands, DeviceList, ListDevicesRequest};
pub use context::RequestContext;
pub use errors::{ApiError, ApiErrorCategory};
