//! SSH client sessions over device tunnels
//!
//! The device agent terminates SSH at the far end of an authenticated
//! WebSocket tunnel. The tunnel is the trust boundary, so the host key is
//! accepted as-is and the session authenticates with `none`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Sink, Stream};
use russh::client::{self, Handle};
use russh::{ChannelMsg, Disconnect};
use synpse_common::observability::Logger;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use super::errors::SshError;
use super::keepalive::{spawn_keepalive, KeepaliveTarget, KeepaliveTimings};
use crate::api::{ApiClient, ApiError, RequestContext};
use crate::tunnel::{TunnelConnection, TunnelHandle};

/// Upper bound on version exchange, key exchange and authentication
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

struct AcceptAnyHostKey;

#[async_trait]
impl client::Handler for AcceptAnyHostKey {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        _server_public_key: &russh_keys::key::PublicKey,
    ) -> Result<bool, Self::Error> {
        Ok(true)
    }
}

struct SessionKeepalive {
    tunnel: TunnelHandle,
    session: Arc<Handle<AcceptAnyHostKey>>,
}

impl KeepaliveTarget for SessionKeepalive {
    fn set_deadline(&self, deadline: Instant) -> Result<(), SshError> {
        self.tunnel.set_deadline(Some(deadline)).map_err(SshError::Deadline)
    }

    fn check_alive(&self) -> Result<(), SshError> {
        if self.session.is_closed() {
            return Err(SshError::SessionClosed);
        }
        Ok(())
    }
}

/// One SSH client bound to one tunnel.
///
/// A background task keeps the session alive until the session is closed
/// or dropped, or until the parent token passed to
/// [`connect`](Self::connect) is cancelled.
pub struct DeviceSshSession {
    session: Arc<Handle<AcceptAnyHostKey>>,
    tunnel: TunnelHandle,
    cancel: CancellationToken,
    keepalive: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for DeviceSshSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceSshSession")
            .field("peer_addr", &self.tunnel.peer_addr())
            .field("closed", &self.tunnel.is_closed())
            .finish_non_exhaustive()
    }
}

impl DeviceSshSession {
    /// Run the SSH handshake over `tunnel` and start keepalives.
    ///
    /// The tunnel is closed if the handshake fails.
    ///
    /// # Errors
    ///
    /// * [`SshError::Handshake`] if the SSH exchange fails
    /// * [`SshError::HandshakeTimeout`] after [`HANDSHAKE_TIMEOUT`]
    /// * [`SshError::AuthenticationRejected`] if the device refuses `none`
    pub async fn connect<S>(
        tunnel: TunnelConnection<S>,
        logger: Arc<dyn Logger>,
        parent_cancel: &CancellationToken,
    ) -> Result<Self, SshError>
    where
        S: Stream<Item = Result<Message, WsError>>
            + Sink<Message, Error = WsError>
            + Unpin
            + Send
            + 'static,
    {
        Self::connect_with(tunnel, logger, parent_cancel, KeepaliveTimings::default()).await
    }

    /// [`connect`](Self::connect) with custom keepalive timings.
    ///
    /// The SSH transport sends a keepalive request after `timings.interval`
    /// without traffic from the device; the tunnel deadline is pushed to
    /// `interval + grace` ahead on every tick.
    ///
    /// # Errors
    ///
    /// As for [`connect`](Self::connect).
    pub async fn connect_with<S>(
        tunnel: TunnelConnection<S>,
        logger: Arc<dyn Logger>,
        parent_cancel: &CancellationToken,
        timings: KeepaliveTimings,
    ) -> Result<Self, SshError>
    where
        S: Stream<Item = Result<Message, WsError>>
            + Sink<Message, Error = WsError>
            + Unpin
            + Send
            + 'static,
    {
        let tunnel_handle = tunnel.handle();
        let handshake = async {
            // keepalive_max 0: the tunnel deadline decides when a silent peer is gone
            let config = Arc::new(client::Config {
                keepalive_interval: Some(timings.interval),
                keepalive_max: 0,
                ..client::Config::default()
            });
            let mut session = client::connect_stream(config, tunnel, AcceptAnyHostKey)
                .await
                .map_err(SshError::Handshake)?;
            if !session.authenticate_none("").await.map_err(SshError::Handshake)? {
                return Err(SshError::AuthenticationRejected);
            }
            Ok(session)
        };

        let session = match tokio::time::timeout(HANDSHAKE_TIMEOUT, handshake).await {
            Ok(Ok(session)) => Arc::new(session),
            Ok(Err(err)) => {
                tunnel_handle.close();
                return Err(err);
            }
            Err(_) => {
                tunnel_handle.close();
                return Err(SshError::HandshakeTimeout(HANDSHAKE_TIMEOUT));
            }
        };
        debug!(peer = ?tunnel_handle.peer_addr(), "SSH session established");

        let cancel = parent_cancel.child_token();
        let target =
            Arc::new(SessionKeepalive { tunnel: tunnel_handle.clone(), session: session.clone() });
        let keepalive = spawn_keepalive(target, timings, logger, cancel.clone());

        Ok(Self { session, tunnel: tunnel_handle, cancel, keepalive: Some(keepalive) })
    }

    /// Run `command` in a fresh channel and return stdout and stderr
    /// combined.
    ///
    /// The channel is closed whatever the outcome.
    ///
    /// # Errors
    ///
    /// * [`SshError::Session`] if the channel cannot be opened or used
    /// * [`SshError::CommandFailed`] on a non-zero exit status
    /// * [`SshError::MissingExitStatus`] if the channel closes without one
    #[instrument(skip(self))]
    pub async fn run_command(&self, command: &str) -> Result<String, SshError> {
        let mut channel = self.session.channel_open_session().await.map_err(SshError::Session)?;
        let result = collect_output(&mut channel, command).await;
        if let Err(err) = channel.close().await {
            debug!(error = %err, "closing SSH channel failed");
        }
        result
    }

    /// Whether the session was closed or its transport has stopped
    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled() || self.tunnel.is_closed() || self.session.is_closed()
    }

    /// Stop keepalives, disconnect and close the tunnel.
    pub async fn close(mut self) {
        self.cancel.cancel();
        if let Err(err) = self.session.disconnect(Disconnect::ByApplication, "", "en").await {
            debug!(error = %err, "SSH disconnect failed");
        }
        if let Some(task) = self.keepalive.take() {
            if let Err(err) = task.await {
                debug!(error = %err, "SSH keepalive task failed");
            }
        }
        self.tunnel.close();
    }
}

impl Drop for DeviceSshSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        self.tunnel.close();
    }
}

async fn collect_output(
    channel: &mut russh::Channel<client::Msg>,
    command: &str,
) -> Result<String, SshError> {
    channel.exec(true, command).await.map_err(SshError::Session)?;

    let mut output = Vec::new();
    let mut exit_status = None;
    while let Some(msg) = channel.wait().await {
        match msg {
            ChannelMsg::Data { ref data } | ChannelMsg::ExtendedData { ref data, .. } => {
                output.extend_from_slice(data);
            }
            ChannelMsg::ExitStatus { exit_status: status } => exit_status = Some(status),
            _ => {}
        }
    }

    let output = String::from_utf8_lossy(&output).into_owned();
    match exit_status {
        Some(0) => Ok(output),
        Some(exit_status) => Err(SshError::CommandFailed { exit_status, output }),
        None => Err(SshError::MissingExitStatus { output }),
    }
}

impl ApiClient {
    /// Open an SSH session to a device.
    ///
    /// Keepalives stop when `ctx` is cancelled or the session is closed.
    ///
    /// # Errors
    ///
    /// Tunnel errors as for [`ApiClient::dial_tunnel`], or
    /// [`ApiError::Ssh`] if the handshake fails.
    pub async fn device_ssh(
        &self,
        ctx: &RequestContext,
        device_id: &str,
    ) -> Result<DeviceSshSession, ApiError> {
        let url = self.websocket_url(&[
            "projects",
            self.require_project()?,
            "devices",
            device_id,
            "ssh",
        ])?;
        let tunnel = self.dial_tunnel(ctx, url).await?;
        let session =
            DeviceSshSession::connect(tunnel, Arc::clone(self.logger()), ctx.cancellation_token())
                .await?;
        Ok(session)
    }

    /// Run one command on a device and return its combined output.
    ///
    /// # Errors
    ///
    /// As [`ApiClient::device_ssh`], plus [`ApiError::Ssh`] wrapping
    /// [`SshError::CommandFailed`] when the command exits non-zero. The
    /// output stays available through [`SshError::output`].
    pub async fn run_device_command(
        &self,
        ctx: &RequestContext,
        device_id: &str,
        command: &str,
    ) -> Result<String, ApiError> {
        let session = self.device_ssh(ctx, device_id).await?;
        let result = session.run_command(command).await;
        session.close().await;
        Ok(result?)
    }
}
