//! Injectable line logger
//!
//! Library components that emit human-readable diagnostics (retry backoff
//! notices, keepalive failures) write through a [`Logger`] owned by the
//! client instead of a process-global sink. The default [`TracingLogger`]
//! forwards to `tracing`; [`NoopLogger`] discards; [`RecordingLogger`] keeps
//! lines in memory for assertions.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

/// Sink for formatted diagnostic lines.
pub trait Logger: Send + Sync + fmt::Debug {
    /// Write one formatted line.
    fn log_line(&self, line: fmt::Arguments<'_>);
}

impl<T: Logger + ?Sized> Logger for Arc<T> {
    fn log_line(&self, line: fmt::Arguments<'_>) {
        (**self).log_line(line);
    }
}

/// Forwards every line to `tracing` at INFO under the `synpse` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log_line(&self, line: fmt::Arguments<'_>) {
        tracing::info!(target: "synpse", "{line}");
    }
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log_line(&self, _line: fmt::Arguments<'_>) {}
}

/// Keeps every line in memory. Clones share the buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingLogger {
    lines: Arc<Mutex<Vec<String>>>,
}

impl RecordingLogger {
    /// Empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded lines
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }

    /// Whether any recorded line contains `needle`
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().iter().any(|line| line.contains(needle))
    }
}

impl Logger for RecordingLogger {
    fn log_line(&self, line: fmt::Arguments<'_>) {
        self.lines.lock().push(line.to_string());
    }
}

/// Format and write a line through a [`Logger`].
///
/// ```rust
/// use synpse_common::log_line;
/// use synpse_common::observability::RecordingLogger;
///
/// let logger = RecordingLogger::new();
/// log_line!(logger, "retry {} of {}", 1, 3);
/// assert_eq!(logger.lines(), vec!["retry 1 of 3".to_string()]);
/// ```
#[macro_export]
macro_rules! log_line {
    ($logger:expr, $($arg:tt)+) => {
        $crate::observability::Logger::log_line(&$logger, format_args!($($arg)+))
    };
}
