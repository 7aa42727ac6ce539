//! Resource operations
//!
//! [`ApiCommands`] wraps an [`ApiClient`] with one method per API call.
//! Required identifiers are checked before any request goes out, and every
//! call is a single logical request through [`ApiClient::execute`], so rate
//! limiting and retries apply uniformly.

mod applications;
mod devices;
mod jobs;
mod namespaces;
mod projects;
mod registration_tokens;
mod secrets;

use std::sync::Arc;

use url::Url;

pub use devices::{DeviceList, ListDevicesRequest};

use super::client::ApiClient;
use super::errors::ApiError;

/// Typed operations on projects, namespaces, devices, applications, jobs,
/// secrets and device registration tokens.
///
/// Cheap to clone; clones share the client.
#[derive(Debug, Clone)]
pub struct ApiCommands {
    client: Arc<ApiClient>,
}

impl ApiCommands {
    pub fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<ApiClient> {
        &self.client
    }

    /// `projects/{project}/{rest..}`
    fn project_url(&self, rest: &[&str]) -> Result<Url, ApiError> {
        let mut segments = vec!["projects", self.client.require_project()?];
        segments.extend_from_slice(rest);
        self.client.url(&segments)
    }

    /// `projects/{project}/namespaces/{namespace}/{rest..}`
    fn namespace_url(&self, namespace: &str, rest: &[&str]) -> Result<Url, ApiError> {
        if namespace.is_empty() {
            return Err(ApiError::namespace_not_specified());
        }
        let mut segments = vec!["namespaces", namespace];
        segments.extend_from_slice(rest);
        self.project_url(&segments)
    }
}

fn require(value: &str, message: &str) -> Result<(), ApiError> {
    if value.is_empty() {
        Err(ApiError::InvalidArgument(message.to_string()))
    } else {
        Ok(())
    }
}
