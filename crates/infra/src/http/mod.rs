//! HTTP transport
//!
//! One physical request per call. Everything above a single attempt
//! (retries, rate limiting, status classification) is the job of
//! [`crate::api::ApiClient`].

pub mod client;
pub mod request;

pub use client::{HttpClient, HttpClientBuilder, CLIENT_REQUEST_ID};
pub use request::{ApiRequest, ApiResponse, RequestBody};
