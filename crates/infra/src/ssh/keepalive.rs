//! Keepalive loop for SSH sessions over tunnels
//!
//! The tunnel deadline is pushed forward on every tick, so a peer that
//! stops answering surfaces as a timed-out read instead of a hang.

use std::sync::Arc;
use std::time::Duration;

use synpse_common::log_line;
use synpse_common::observability::Logger;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::errors::SshError;

/// Time between keepalive requests
pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(18);

/// Slack on top of the interval before the tunnel deadline expires
pub const KEEPALIVE_GRACE: Duration = Duration::from_secs(15);

/// How often a session is kept alive and how long a silent peer is given
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeepaliveTimings {
    pub interval: Duration,
    pub grace: Duration,
}

impl Default for KeepaliveTimings {
    fn default() -> Self {
        Self { interval: KEEPALIVE_INTERVAL, grace: KEEPALIVE_GRACE }
    }
}

/// What the loop needs from a live session
pub trait KeepaliveTarget: Send + Sync {
    /// Move the read and write deadline of the underlying connection
    fn set_deadline(&self, deadline: Instant) -> Result<(), SshError>;

    /// Fail once the SSH transport has stopped. While it runs, the transport
    /// sends a `keepalive@openssh.com` request with want-reply whenever it
    /// has been idle for one interval.
    fn check_alive(&self) -> Result<(), SshError>;
}

/// Run keepalives until `cancel` fires or a step fails.
///
/// Cancellation returns `Ok`. A failure ends the loop and is returned; the
/// session stays usable until its connection actually breaks.
pub async fn run_keepalive<T: KeepaliveTarget + ?Sized>(
    target: &T,
    timings: KeepaliveTimings,
    cancel: &CancellationToken,
) -> Result<(), SshError> {
    loop {
        target.set_deadline(Instant::now() + timings.interval + timings.grace)?;
        tokio::select! {
            () = cancel.cancelled() => {
                debug!("SSH keepalive loop cancelled");
                return Ok(());
            }
            () = tokio::time::sleep(timings.interval) => target.check_alive()?,
        }
    }
}

/// Spawn [`run_keepalive`], reporting failure through `logger`.
pub fn spawn_keepalive(
    target: Arc<dyn KeepaliveTarget>,
    timings: KeepaliveTimings,
    logger: Arc<dyn Logger>,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(err) = run_keepalive(target.as_ref(), timings, &cancel).await {
            log_line!(logger, "Failed to setup SSH client keepalives: {err}");
        }
    })
}
