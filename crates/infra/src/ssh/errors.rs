use std::io;
use std::time::Duration;

use thiserror::Error;

/// Failures of an SSH session carried over a device tunnel
#[derive(Debug, Error)]
pub enum SshError {
    #[error("failed to establish SSH connection, error: {0}")]
    Handshake(#[source] russh::Error),

    #[error("failed to establish SSH connection, error: handshake timed out after {0:?}")]
    HandshakeTimeout(Duration),

    #[error("failed to establish SSH connection, error: authentication rejected")]
    AuthenticationRejected,

    #[error("SSH session error: {0}")]
    Session(#[source] russh::Error),

    /// The command ran and exited non-zero. `output` holds stdout and
    /// stderr as received.
    #[error("SSH command error: process exited with status {exit_status}")]
    CommandFailed { exit_status: u32, output: String },

    #[error("SSH command error: channel closed without an exit status")]
    MissingExitStatus { output: String },

    #[error("failed to set deadline: {0}")]
    Deadline(#[source] io::Error),

    #[error("failed to send keep alive: SSH session closed")]
    SessionClosed,
}

impl SshError {
    /// Output collected before the command failed, if any
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::CommandFailed { output, .. } | Self::MissingExitStatus { output } => {
                Some(output)
            }
            _ => None,
        }
    }
}
