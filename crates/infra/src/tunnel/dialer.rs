//! Opening device tunnels
//!
//! Tunnels are WebSocket upgrades against the same API as the HTTP calls,
//! authenticated the same way. They bypass the rate limiter and are never
//! retried.

use reqwest::header::{AUTHORIZATION, USER_AGENT};
use synpse_domain::LogsOptions;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, instrument};
use url::Url;

use super::connection::TunnelConnection;
use crate::api::{ApiClient, ApiError, RequestContext};

/// Tunnel to a device over a live network socket
pub type DeviceTunnel = TunnelConnection<WebSocketStream<MaybeTlsStream<TcpStream>>>;

fn socket_of(stream: &MaybeTlsStream<TcpStream>) -> Option<&TcpStream> {
    match stream {
        MaybeTlsStream::Plain(tcp) => Some(tcp),
        MaybeTlsStream::Rustls(tls) => Some(tls.get_ref().0),
        _ => None,
    }
}

impl ApiClient {
    /// Open a WebSocket tunnel to `url`.
    ///
    /// # Errors
    ///
    /// * [`ApiError::Cancelled`] if `ctx` finishes before the upgrade
    /// * [`ApiError::Tunnel`] if the connection or upgrade fails
    #[instrument(skip(self, ctx), fields(url = %url))]
    pub async fn dial_tunnel(
        &self,
        ctx: &RequestContext,
        url: Url,
    ) -> Result<DeviceTunnel, ApiError> {
        let mut request = url.as_str().into_client_request()?;
        let headers = request.headers_mut();
        headers.insert(AUTHORIZATION, self.http().authorization());
        headers.insert(USER_AGENT, self.http().user_agent().clone());

        let (socket, response) = ctx
            .run(tokio_tungstenite::connect_async(request))
            .await
            .ok_or(ApiError::Cancelled)??;
        debug!(status = %response.status(), "tunnel established");

        let tcp = socket_of(socket.get_ref());
        let local_addr = tcp.and_then(|s| s.local_addr().ok());
        let peer_addr = tcp.and_then(|s| s.peer_addr().ok());
        Ok(TunnelConnection::new(socket, local_addr, peer_addr))
    }

    /// TCP tunnel to `hostname:port` as seen from the device.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::dial_tunnel`], plus [`ApiError::InvalidArgument`]
    /// when no project is configured.
    pub async fn device_connect(
        &self,
        ctx: &RequestContext,
        device_id: &str,
        port: u16,
        hostname: &str,
    ) -> Result<DeviceTunnel, ApiError> {
        let mut url = self.websocket_url(&[
            "projects",
            self.require_project()?,
            "devices",
            device_id,
            "connect",
        ])?;
        url.query_pairs_mut()
            .append_pair("port", &port.to_string())
            .append_pair("hostname", hostname);
        self.dial_tunnel(ctx, url).await
    }

    /// Log stream of one application, optionally narrowed to `container`.
    ///
    /// # Errors
    ///
    /// [`ApiError::InvalidArgument`] for an empty namespace or application,
    /// otherwise the same as [`ApiClient::dial_tunnel`].
    pub async fn application_logs(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        application: &str,
        container: Option<&str>,
        options: &LogsOptions,
    ) -> Result<DeviceTunnel, ApiError> {
        if namespace.is_empty() {
            return Err(ApiError::namespace_not_specified());
        }
        let project = self.require_project()?;
        if application.is_empty() {
            return Err(ApiError::InvalidArgument(ApiError::APPLICATION_NOT_SELECTED.to_string()));
        }
        let mut url = self.websocket_url(&[
            "projects",
            project,
            "namespaces",
            namespace,
            "applications",
            application,
            "logs",
            container.unwrap_or_default(),
        ])?;
        url.query_pairs_mut().extend_pairs(options.query_pairs());
        self.dial_tunnel(ctx, url).await
    }

    /// Log stream of one job.
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::application_logs`].
    pub async fn job_logs(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        job: &str,
        options: &LogsOptions,
    ) -> Result<DeviceTunnel, ApiError> {
        if namespace.is_empty() {
            return Err(ApiError::namespace_not_specified());
        }
        let project = self.require_project()?;
        if job.is_empty() {
            return Err(ApiError::InvalidArgument(ApiError::JOB_NOT_SELECTED.to_string()));
        }
        let mut url = self.websocket_url(&[
            "projects",
            project,
            "namespaces",
            namespace,
            "jobs",
            job,
            "logs",
        ])?;
        url.query_pairs_mut().extend_pairs(options.query_pairs());
        self.dial_tunnel(ctx, url).await
    }
}
