//! API client with rate limiting and retry logic
//!
//! [`ApiClient::execute`] turns one [`ApiRequest`] into at most
//! `max_retries + 1` physical attempts. Each attempt first takes a token
//! from the client's rate limiter; transport failures, 429 and 5xx
//! responses are retried with capped exponential backoff. The terminal
//! response is classified into [`ApiError`] variants.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use synpse_common::log_line;
use synpse_common::observability::{Logger, TracingLogger};
use synpse_common::resilience::{
    AttemptOutcome, RateLimitError, RateLimiter, RetryDecision, RetryPolicy, TokenBucket,
};
use synpse_domain::constants::DEFAULT_API_URL;
use synpse_domain::ClientSettings;
use tracing::{debug, instrument};
use url::Url;

use super::context::RequestContext;
use super::errors::ApiError;
use crate::http::{ApiRequest, ApiResponse, HttpClient};

/// Synpse API client.
///
/// Immutable once built and cheap to share behind an `Arc`.
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    project_id: Option<String>,
    retry_policy: RetryPolicy,
    rate_limiter: Arc<dyn RateLimiter>,
    logger: Arc<dyn Logger>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("project_id", &self.project_id)
            .field("retry_policy", &self.retry_policy)
            .field("rate_limiter", &self.rate_limiter)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Client for `access_key` with default settings.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] with [`ApiError::EMPTY_CREDENTIALS`] if
    /// the key is empty.
    pub fn new(access_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::builder().access_key(access_key).build()
    }

    /// Client preconfigured for one project
    ///
    /// # Errors
    ///
    /// Same as [`ApiClient::new`].
    pub fn with_project(
        access_key: impl Into<String>,
        project_id: impl Into<String>,
    ) -> Result<Self, ApiError> {
        Self::builder().access_key(access_key).project_id(project_id).build()
    }

    /// Client built from loaded settings
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if the settings are inconsistent or a
    /// custom header is not a valid HTTP header.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ApiError> {
        settings.validate().map_err(|err| ApiError::Config(err.to_string()))?;

        let retry_policy = RetryPolicy::new(
            settings.retry.max_retries,
            settings.retry.min_retry_delay(),
            settings.retry.max_retry_delay(),
        )
        .map_err(|err| ApiError::Config(err.to_string()))?;
        let rate_limiter = TokenBucket::per_second(
            settings.rate_limit.requests_per_second,
            settings.rate_limit.burst,
        )
        .map_err(|err| ApiError::Config(err.to_string()))?;

        let mut headers = HeaderMap::new();
        for (name, value) in &settings.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|err| ApiError::Config(format!("Invalid header name {name:?}: {err}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|err| ApiError::Config(format!("Invalid value for {name}: {err}")))?;
            headers.insert(name, value);
        }

        let mut builder = Self::builder()
            .access_key(settings.access_key.clone())
            .base_url(settings.api_url.clone())
            .user_agent(settings.user_agent.clone())
            .retry_policy(retry_policy)
            .rate_limiter(Arc::new(rate_limiter))
            .headers(headers);
        if let Some(project_id) = &settings.project_id {
            builder = builder.project_id(project_id.clone());
        }
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        builder.build()
    }

    /// Client configured from `SYNPSE_*` environment variables
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] if `SYNPSE_ACCESS_KEY` is missing or any
    /// variable has an invalid value.
    pub fn from_env() -> Result<Self, ApiError> {
        let settings = crate::config::load_from_env()?;
        Self::from_settings(&settings)
    }

    /// Create a builder for fluent configuration
    pub fn builder() -> ApiClientBuilder {
        ApiClientBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    pub fn logger(&self) -> &Arc<dyn Logger> {
        &self.logger
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Configured project id, or an argument error when none is set
    pub(crate) fn require_project(&self) -> Result<&str, ApiError> {
        self.project_id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::InvalidArgument("project not specified".to_string()))
    }

    /// Absolute HTTP URL for `segments` below the base URL.
    ///
    /// Segments are percent-encoded individually; empty segments are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the result does not parse.
    pub fn url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut joined = self.base_url.clone();
        for segment in segments.iter().filter(|s| !s.is_empty()) {
            joined.push('/');
            joined.push_str(&urlencoding::encode(segment));
        }
        Url::parse(&joined).map_err(|err| ApiError::InvalidUrl(format!("{joined}: {err}")))
    }

    /// WebSocket URL for `segments`: `http` bases become `ws`, everything
    /// else becomes `wss`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidUrl`] if the base URL cannot carry a
    /// WebSocket scheme.
    pub fn websocket_url(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.url(segments)?;
        let scheme = if url.scheme() == "http" { "ws" } else { "wss" };
        url.set_scheme(scheme).map_err(|()| {
            ApiError::InvalidUrl(format!("cannot use {scheme} with base URL {}", self.base_url))
        })?;
        Ok(url)
    }

    /// Execute a logical request with rate limiting and retries.
    ///
    /// Returns the raw response for any 2xx status; decoding is left to
    /// the caller (see [`ApiResponse::json`]).
    ///
    /// # Errors
    ///
    /// * [`ApiError::RateLimitWaitCancelled`] if `ctx` finishes while
    ///   waiting for a rate-limit token
    /// * [`ApiError::Cancelled`] if `ctx` finishes during I/O
    /// * [`ApiError::Transport`] if the last attempt failed to connect
    /// * a status variant for any terminal non-2xx response
    #[instrument(
        skip(self, ctx, request),
        fields(method = %request.method(), url = %request.url())
    )]
    pub async fn execute(
        &self,
        ctx: &RequestContext,
        request: ApiRequest,
    ) -> Result<ApiResponse, ApiError> {
        let method = request.method().clone();
        let url = request.url().clone();
        let mut attempt = 0u32;

        loop {
            self.wait_for_rate_limit(ctx).await?;

            let sent =
                ctx.run(self.http.send(&request, attempt)).await.ok_or(ApiError::Cancelled)?;
            let (outcome, terminal) = match sent {
                Ok(response) => {
                    let status = response.status();
                    let headers = response.headers().clone();
                    let body = ctx.run(response.bytes()).await.ok_or(ApiError::Cancelled)?;
                    let outcome = AttemptOutcome::Status(status.as_u16());

                    if outcome.is_retryable() {
                        let text = body.as_ref().map(|b| flatten_body(b)).unwrap_or_default();
                        log_line!(
                            self.logger,
                            "Request: {method} {url} got an error response {}: {text}",
                            status.as_u16()
                        );
                    }
                    let terminal = body
                        .map_err(ApiError::Transport)
                        .and_then(|body| classify(status, headers, body));
                    (outcome, terminal)
                }
                Err(err) => {
                    log_line!(self.logger, "Error performing request: {method} {url} : {err}");
                    (AttemptOutcome::Transport, Err(ApiError::Transport(err)))
                }
            };

            match self.retry_policy.decide(attempt, outcome) {
                RetryDecision::Stop => return terminal,
                RetryDecision::Retry(delay) => {
                    attempt += 1;
                    log_line!(
                        self.logger,
                        "Sleeping {delay:?} before retry attempt number {attempt} for request {method} {url}"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// GET `url` and decode the JSON body
    pub(crate) async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        url: Url,
        context: &'static str,
    ) -> Result<T, ApiError> {
        self.execute(ctx, ApiRequest::new(Method::GET, url)).await?.json(context)
    }

    /// Send `body` as JSON with `method` and decode the JSON reply
    pub(crate) async fn send_json<B, T>(
        &self,
        ctx: &RequestContext,
        method: Method,
        url: Url,
        body: &B,
        context: &'static str,
    ) -> Result<T, ApiError>
    where
        B: serde::Serialize + ?Sized,
        T: serde::de::DeserializeOwned,
    {
        let request = ApiRequest::new(method, url).with_json(body)?;
        self.execute(ctx, request).await?.json(context)
    }

    /// DELETE `url`, ignoring any response body
    pub(crate) async fn delete(&self, ctx: &RequestContext, url: Url) -> Result<(), ApiError> {
        self.execute(ctx, ApiRequest::new(Method::DELETE, url)).await.map(|_| ())
    }

    async fn wait_for_rate_limit(&self, ctx: &RequestContext) -> Result<(), ApiError> {
        match ctx.run(self.rate_limiter.wait(ctx.cancellation_token())).await {
            Some(Ok(())) => Ok(()),
            Some(Err(RateLimitError::Cancelled)) | None => {
                debug!("rate limit wait cancelled");
                Err(ApiError::RateLimitWaitCancelled)
            }
            Some(Err(err)) => Err(ApiError::Config(err.to_string())),
        }
    }
}

/// Success passes through; everything else becomes a typed error.
fn classify(
    status: StatusCode,
    headers: HeaderMap,
    body: bytes::Bytes,
) -> Result<ApiResponse, ApiError> {
    match ApiError::from_status(status, &body) {
        None => Ok(ApiResponse::new(status, headers, body)),
        Some(err) => Err(err),
    }
}

fn flatten_body(body: &[u8]) -> String {
    String::from_utf8_lossy(body).replace(['\n', '\t'], "")
}

/// Builder for [`ApiClient`]
#[derive(Default)]
pub struct ApiClientBuilder {
    access_key: String,
    base_url: Option<String>,
    project_id: Option<String>,
    user_agent: Option<String>,
    http_client: Option<reqwest::Client>,
    timeout: Option<Duration>,
    headers: HeaderMap,
    retry_policy: Option<RetryPolicy>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    logger: Option<Arc<dyn Logger>>,
}

impl ApiClientBuilder {
    pub fn access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = key.into();
        self
    }

    /// API root, e.g. `https://cloud.synpse.net/api`
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Replace the underlying reqwest client
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Per-attempt timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Headers sent with every request. Per-request headers take precedence.
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = Some(policy);
        self
    }

    pub fn rate_limiter(mut self, limiter: Arc<dyn RateLimiter>) -> Self {
        self.rate_limiter = Some(limiter);
        self
    }

    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Config`] for an empty access key, an invalid
    /// user agent or a base URL that does not parse.
    pub fn build(self) -> Result<ApiClient, ApiError> {
        if self.access_key.is_empty() {
            return Err(ApiError::Config(ApiError::EMPTY_CREDENTIALS.to_string()));
        }

        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|err| ApiError::Config(format!("Invalid base URL {base_url:?}: {err}")))?;

        let mut http =
            HttpClient::builder().access_key(self.access_key).default_headers(self.headers);
        if let Some(client) = self.http_client {
            http = http.client(client);
        }
        if let Some(agent) = self.user_agent {
            http = http.user_agent(agent);
        }
        if let Some(timeout) = self.timeout {
            http = http.timeout(timeout);
        }

        let rate_limiter = match self.rate_limiter {
            Some(limiter) => limiter,
            None => Arc::new(TokenBucket::default()),
        };

        Ok(ApiClient {
            http: http.build()?,
            base_url,
            project_id: self.project_id,
            retry_policy: self.retry_policy.unwrap_or_default(),
            rate_limiter,
            logger: self.logger.unwrap_or_else(|| Arc::new(TracingLogger)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::builder().access_key("k").base_url(base).project_id("p1").build().unwrap()
    }

    #[test]
    fn test_empty_access_key_is_rejected() {
        let err = ApiClient::new("").unwrap_err();
        assert_eq!(err.to_string(), "invalid credentials: access key must not be empty");

        let err = ApiClient::with_project("", "p1").unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }

    #[test]
    fn test_defaults() {
        let client = ApiClient::new("k").unwrap();
        assert_eq!(client.base_url(), "https://cloud.synpse.net/api");
        assert_eq!(client.project_id(), None);
        assert_eq!(client.retry_policy(), &RetryPolicy::default());
    }

    #[test]
    fn test_url_joins_and_encodes_segments() {
        let client = client("https://cloud.example/api/");
        let url = client.url(&["projects", "p1", "namespaces", "team a", "secrets"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://cloud.example/api/projects/p1/namespaces/team%20a/secrets"
        );

        let url = client.url(&["projects", "p1", "applications", "app", "logs", ""]).unwrap();
        assert!(url.as_str().ends_with("/applications/app/logs"));
    }

    #[test]
    fn test_websocket_scheme_follows_base() {
        let secure = client("https://cloud.example/api");
        assert_eq!(
            secure.websocket_url(&["projects", "p1", "devices", "d1", "ssh"]).unwrap().as_str(),
            "wss://cloud.example/api/projects/p1/devices/d1/ssh"
        );

        let plain = client("http://127.0.0.1:8080/api");
        assert_eq!(plain.websocket_url(&["x"]).unwrap().scheme(), "ws");
    }

    #[test]
    fn test_require_project() {
        let without = ApiClient::new("k").unwrap();
        assert!(matches!(without.require_project(), Err(ApiError::InvalidArgument(_))));
        assert_eq!(client("https://a.example").require_project().unwrap(), "p1");
    }

    #[test]
    fn test_from_settings_applies_everything() {
        let mut settings = ClientSettings::with_access_key("k");
        settings.api_url = "http://localhost:9000/api".into();
        settings.project_id = Some("proj".into());
        settings.retry.max_retries = 1;
        settings.headers.insert("x-trace".into(), "on".into());

        let client = ApiClient::from_settings(&settings).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9000/api");
        assert_eq!(client.project_id(), Some("proj"));
        assert_eq!(client.retry_policy().max_retries(), 1);
    }

    #[test]
    fn test_from_settings_rejects_bad_header() {
        let mut settings = ClientSettings::with_access_key("k");
        settings.headers.insert("bad header".into(), "v".into());
        assert!(matches!(ApiClient::from_settings(&settings), Err(ApiError::Config(_))));
    }

    #[test]
    fn test_flatten_body_strips_newlines_and_tabs() {
        assert_eq!(flatten_body(b"{\n\t\"error\": \"busy\"\n}"), "{\"error\": \"busy\"}");
    }
}
