use std::fmt;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{Client as ReqwestClient, Response};
use synpse_domain::constants::{CLIENT_REQUEST_ID_HEADER, DEFAULT_USER_AGENT};
use tracing::debug;
use uuid::Uuid;

use super::request::ApiRequest;
use crate::api::errors::ApiError;

/// Header carrying the per-attempt request id
pub const CLIENT_REQUEST_ID: HeaderName = HeaderName::from_static(CLIENT_REQUEST_ID_HEADER);

/// Performs single authenticated HTTP attempts.
///
/// Retries, rate limiting and status classification live in
/// [`ApiClient`](crate::api::ApiClient); this type only turns one
/// [`ApiRequest`] into one wire request.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    access_key: String,
    user_agent: HeaderValue,
    default_headers: HeaderMap,
    timeout: Option<Duration>,
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("user_agent", &self.user_agent)
            .field("default_headers", &self.default_headers.keys().collect::<Vec<_>>())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Send one attempt of `request`.
    ///
    /// Every call carries a freshly generated client request id, so retries
    /// of the same logical request are distinguishable server side.
    ///
    /// # Errors
    ///
    /// Returns the underlying [`reqwest::Error`] when the request could not
    /// be sent or no response head arrived. HTTP error statuses are not
    /// errors at this layer.
    pub async fn send(
        &self,
        request: &ApiRequest,
        attempt: u32,
    ) -> Result<Response, reqwest::Error> {
        let request_id = Uuid::new_v4().to_string();
        let method = request.method().clone();
        let url = request.url().clone();

        let mut builder = self
            .client
            .request(method.clone(), url.clone())
            .headers(self.attempt_headers(request, &request_id))
            .basic_auth(&self.access_key, Some(""));
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(body) = request.body() {
            builder = builder.body(body.bytes().clone());
        }

        debug!(attempt = attempt + 1, %method, %url, %request_id, "sending HTTP request");
        let response = builder.send().await?;
        debug!(
            attempt = attempt + 1,
            %method,
            %url,
            status = %response.status(),
            "received HTTP response"
        );
        Ok(response)
    }

    /// `Authorization` value for upgrade requests that bypass [`send`](Self::send).
    #[must_use]
    pub fn authorization(&self) -> HeaderValue {
        let encoded = STANDARD.encode(format!("{}:", self.access_key));
        let mut value = HeaderValue::from_str(&format!("Basic {encoded}"))
            .unwrap_or_else(|_| HeaderValue::from_static("Basic"));
        value.set_sensitive(true);
        value
    }

    pub fn user_agent(&self) -> &HeaderValue {
        &self.user_agent
    }

    /// Client-wide headers, per-request headers on top, then the fixed ones.
    fn attempt_headers(&self, request: &ApiRequest, request_id: &str) -> HeaderMap {
        let mut headers = self.default_headers.clone();
        for (name, value) in request.headers() {
            headers.insert(name.clone(), value.clone());
        }
        headers.insert(USER_AGENT, self.user_agent.clone());
        headers
            .entry(CONTENT_TYPE)
            .or_insert_with(|| HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(request_id) {
            headers.insert(CLIENT_REQUEST_ID, value);
        }
        headers.remove(AUTHORIZATION);
        headers
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    client: Option<ReqwestClient>,
    access_key: String,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    default_headers: HeaderMap,
}

impl HttpClientBuilder {
    /// Use a preconfigured reqwest client (proxies, TLS roots, pools).
    pub fn client(mut self, client: ReqwestClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn access_key(mut self, key: impl Into<String>) -> Self {
        self.access_key = key.into();
        self
    }

    /// Per-attempt timeout; unset means attempts wait as long as the
    /// caller's context allows.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    pub fn build(self) -> Result<HttpClient, ApiError> {
        let agent = self.user_agent.unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());
        let user_agent = HeaderValue::from_str(&agent)
            .map_err(|err| ApiError::Config(format!("Invalid user agent {agent:?}: {err}")))?;

        let client = match self.client {
            Some(client) => client,
            None => ReqwestClient::builder()
                .build()
                .map_err(|err| ApiError::Config(format!("Failed to build HTTP client: {err}")))?,
        };

        Ok(HttpClient {
            client,
            access_key: self.access_key,
            user_agent,
            default_headers: self.default_headers,
            timeout: self.timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use reqwest::{Method, StatusCode};
    use url::Url;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_key(key: &str) -> HttpClient {
        HttpClient::builder().access_key(key).build().expect("http client")
    }

    fn get(server: &MockServer, route: &str) -> ApiRequest {
        let url = Url::parse(&format!("{}{route}", server.uri())).unwrap();
        ApiRequest::new(Method::GET, url)
    }

    #[tokio::test]
    async fn sends_auth_user_agent_and_content_type() {
        let server = MockServer::start().await;
        // base64("key-1:")
        Mock::given(method("GET"))
            .and(path("/projects"))
            .and(header("authorization", "Basic a2V5LTE6"))
            .and(header("user-agent", "synpse-rs/v1"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_key("key-1");
        let response = client.send(&get(&server, "/projects"), 0).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn request_headers_override_client_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(204)).mount(&server).await;

        let mut defaults = HeaderMap::new();
        defaults.insert("x-team", HeaderValue::from_static("ops"));
        defaults.insert("x-env", HeaderValue::from_static("staging"));
        let client = HttpClient::builder()
            .access_key("k")
            .default_headers(defaults)
            .build()
            .expect("http client");

        let request = get(&server, "/")
            .with_header(HeaderName::from_static("x-env"), HeaderValue::from_static("prod"))
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        client.send(&request, 0).await.expect("response");

        let received = server.received_requests().await.unwrap();
        let headers = &received[0].headers;
        assert_eq!(headers.get("x-team").unwrap(), "ops");
        assert_eq!(headers.get("x-env").unwrap(), "prod");
        assert_eq!(headers.get("content-type").unwrap(), "text/plain");
    }

    #[tokio::test]
    async fn every_attempt_gets_a_new_request_id() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let client = client_with_key("k");
        let request = get(&server, "/");
        client.send(&request, 0).await.expect("first");
        client.send(&request, 1).await.expect("second");

        let received = server.received_requests().await.unwrap();
        let ids: Vec<_> = received
            .iter()
            .map(|r| r.headers.get(CLIENT_REQUEST_ID_HEADER).unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert!(ids.iter().all(|id| Uuid::parse_str(id).is_ok()));
    }

    #[tokio::test]
    async fn custom_user_agent_wins() {
        let server = MockServer::start().await;
        Mock::given(header("user-agent", "fleet-tool/2"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client =
            HttpClient::builder().access_key("k").user_agent("fleet-tool/2").build().unwrap();
        client.send(&get(&server, "/"), 0).await.expect("response");
    }

    #[tokio::test]
    async fn raw_body_is_sent_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST")).respond_with(ResponseTemplate::new(200)).mount(&server).await;

        let client = client_with_key("k");
        let url = Url::parse(&format!("{}/devices/d1/reboot", server.uri())).unwrap();
        let request = ApiRequest::new(Method::POST, url).with_raw_body(&b"\x00raw"[..]);
        client.send(&request, 0).await.expect("response");

        let received = server.received_requests().await.unwrap();
        assert_eq!(received[0].body, b"\x00raw".to_vec());
    }

    #[tokio::test]
    async fn http_error_statuses_are_not_transport_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET")).respond_with(ResponseTemplate::new(503)).mount(&server).await;

        let client = client_with_key("k");
        let response = client.send(&get(&server, "/"), 0).await.expect("response");
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener); // release the port so that requests fail with ECONNREFUSED
        let url = Url::parse(&format!("http://{addr}/")).unwrap();

        let client = client_with_key("k");
        let err = client.send(&ApiRequest::new(Method::GET, url), 0).await.unwrap_err();
        assert!(err.is_connect() || err.is_request());
    }

    #[test]
    fn authorization_encodes_key_with_empty_password() {
        let client = client_with_key("key-1");
        assert_eq!(client.authorization(), "Basic a2V5LTE6");
        assert!(client.authorization().is_sensitive());
    }

    #[test]
    fn rejects_invalid_user_agent() {
        let err = HttpClient::builder().user_agent("bad\nagent").build().unwrap_err();
        assert!(matches!(err, ApiError::Config(_)));
    }
}
