//! Observability primitives
//!
//! Structured logging goes through `tracing` directly. This module holds the
//! narrow [`Logger`] capability that clients accept for human-readable
//! diagnostic lines, so embedding applications can redirect or silence them.

pub mod logger;

pub use logger::{Logger, NoopLogger, RecordingLogger, TracingLogger};
