//! Logical request and response values
//!
//! A [`ApiRequest`] describes one API call independently of how many
//! physical attempts it takes. Bodies are encoded once, up front, so every
//! retry sends identical bytes.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use synpse_domain::Pagination;
use url::Url;

use crate::api::errors::ApiError;

/// Request payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// JSON document, already serialized
    Json(Bytes),
    /// Bytes sent exactly as given
    Raw(Bytes),
}

impl RequestBody {
    /// Serialize `value` as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Serialize`] if serde rejects the value.
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<Self, ApiError> {
        serde_json::to_vec(value)
            .map(|bytes| Self::Json(Bytes::from(bytes)))
            .map_err(ApiError::Serialize)
    }

    /// Encoded bytes
    #[must_use]
    pub fn bytes(&self) -> &Bytes {
        match self {
            Self::Json(bytes) | Self::Raw(bytes) => bytes,
        }
    }
}

/// One logical API call
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    url: Url,
    body: Option<RequestBody>,
    headers: HeaderMap,
}

impl ApiRequest {
    /// Request without a body
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url, body: None, headers: HeaderMap::new() }
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Serialize`] when `value` cannot be encoded; no
    /// attempt is made in that case.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, ApiError> {
        self.body = Some(RequestBody::json(value)?);
        Ok(self)
    }

    /// Attach a body that is sent unencoded
    #[must_use]
    pub fn with_raw_body(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = Some(RequestBody::Raw(bytes.into()));
        self
    }

    /// Set a per-request header, replacing any previous value
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn body(&self) -> Option<&RequestBody> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Successful response with its body fully read
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self { status, headers, body }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8, lossy
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON.
    ///
    /// `context` names what was being decoded and ends up in the error.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unmarshal`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self, context: &'static str) -> Result<T, ApiError> {
        serde_json::from_slice(&self.body)
            .map_err(|source| ApiError::Unmarshal { context, source })
    }

    /// Page metadata carried in the response headers
    #[must_use]
    pub fn pagination(&self) -> Pagination {
        Pagination::from_headers(|name| {
            self.headers.get(name).and_then(|value| value.to_str().ok())
        })
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Thing {
        name: String,
    }

    #[test]
    fn test_json_body_is_encoded_once() {
        let url = Url::parse("https://example.test/api/things").unwrap();
        let request = ApiRequest::new(Method::POST, url)
            .with_json(&serde_json::json!({"name": "a"}))
            .unwrap();

        let expected = RequestBody::Json(Bytes::from_static(br#"{"name":"a"}"#));
        assert_eq!(request.body(), Some(&expected));
    }

    #[test]
    fn test_raw_body_is_untouched() {
        let url = Url::parse("https://example.test/api/reboot").unwrap();
        let request = ApiRequest::new(Method::POST, url).with_raw_body(Bytes::new());

        assert_eq!(request.body().map(RequestBody::bytes), Some(&Bytes::new()));
        assert!(matches!(request.body(), Some(RequestBody::Raw(_))));
    }

    #[test]
    fn test_response_json_failure_names_context() {
        let response =
            ApiResponse::new(StatusCode::OK, HeaderMap::new(), Bytes::from_static(b"not json"));

        let err = response.json::<Thing>("thing").unwrap_err();
        assert!(matches!(err, ApiError::Unmarshal { context: "thing", .. }));

        let body = Bytes::from_static(br#"{"name":"x"}"#);
        let ok = ApiResponse::new(StatusCode::OK, HeaderMap::new(), body);
        assert_eq!(ok.json::<Thing>("thing").unwrap(), Thing { name: "x".into() });
    }

    #[test]
    fn test_pagination_from_response_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("Next-Page-Token", HeaderValue::from_static("p2"));
        headers.insert("Total-Items", HeaderValue::from_static("42"));
        headers.insert("Page-Size", HeaderValue::from_static("ten"));
        let response = ApiResponse::new(StatusCode::OK, headers, Bytes::new());

        let page = response.pagination();
        assert_eq!(page.next_page_token, "p2");
        assert_eq!(page.total_items, 42);
        assert_eq!(page.page_size, 0);
        assert_eq!(page.previous_page_token, "");
    }
}
