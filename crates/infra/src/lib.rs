//! # Synpse Infrastructure
//!
//! Everything that talks to the Synpse API.
//!
//! This crate contains:
//! - The HTTP executor and the request orchestrator (rate limit, retry,
//!   auth, status classification)
//! - Typed resource operations for projects, namespaces, devices,
//!   applications, jobs, secrets and registration tokens
//! - WebSocket device tunnels exposed as byte streams
//! - SSH sessions carried over those tunnels
//! - Loading client settings from the environment or files
//!
//! ## Architecture
//! - Payload types come from `synpse-domain`
//! - Generic policies (rate limiter, retry, logger) come from
//!   `synpse-common`
//! - All I/O lives here

pub mod api;
pub mod config;
pub mod http;
pub mod ssh;
pub mod tunnel;

// Re-export commonly used items
pub use api::{ApiClient, ApiClientBuilder, ApiCommands, ApiError, RequestContext};
pub use ssh::{DeviceSshSession, SshError};
pub use tunnel::{DeviceTunnel, TunnelConnection, TunnelHandle};
