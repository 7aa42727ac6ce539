use reqwest::Method;
use synpse_domain::Secret;
use tracing::{debug, instrument};

use super::{require, ApiCommands};
use crate::api::context::RequestContext;
use crate::api::errors::ApiError;

const SECRET_NAME_REQUIRED: &str = "secret name not specified";

impl ApiCommands {
    /// Create a secret. Plain `data` is base64 encoded before sending.
    ///
    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx, secret), fields(name = %secret.name))]
    pub async fn create_secret(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        secret: &Secret,
    ) -> Result<Secret, ApiError> {
        let url = self.namespace_url(namespace, &["secrets"])?;
        let mut payload = secret.clone();
        payload.encode_data();
        let created: Secret =
            self.client.send_json(ctx, Method::POST, url, &payload, "secret").await?;

        debug!(secret_id = %created.id, "Secret created");
        Ok(created)
    }

    /// Secrets of a namespace, data as stored (base64)
    ///
    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn list_secrets(
        &self,
        ctx: &RequestContext,
        namespace: &str,
    ) -> Result<Vec<Secret>, ApiError> {
        let url = self.namespace_url(namespace, &["secrets"])?;
        self.client.get_json(ctx, url, "secrets").await
    }

    /// Get a secret with its data decoded
    ///
    /// # Errors
    ///
    /// Returns error if the namespace or name is empty or the API request
    /// fails
    #[instrument(skip(self, ctx))]
    pub async fn get_secret(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<Secret, ApiError> {
        let url = self.namespace_url(namespace, &["secrets", name])?;
        require(name, SECRET_NAME_REQUIRED)?;
        let mut secret: Secret = self.client.get_json(ctx, url, "secret").await?;
        secret.decode_data();
        Ok(secret)
    }

    /// Patch a secret, addressed by its name. Plain `data` is base64 encoded
    /// before sending.
    ///
    /// # Errors
    ///
    /// Returns error if the namespace or name is empty or the API request
    /// fails
    #[instrument(skip(self, ctx, secret), fields(name = %secret.name))]
    pub async fn update_secret(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        secret: &Secret,
    ) -> Result<Secret, ApiError> {
        let url = self.namespace_url(namespace, &["secrets", &secret.name])?;
        require(&secret.name, SECRET_NAME_REQUIRED)?;
        let mut payload = secret.clone();
        payload.encode_data();
        self.client.send_json(ctx, Method::PATCH, url, &payload, "secret").await
    }

    /// # Errors
    ///
    /// Returns error if the namespace or name is empty or the API request
    /// fails
    #[instrument(skip(self, ctx))]
    pub async fn delete_secret(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        let url = self.namespace_url(namespace, &["secrets", name])?;
        require(name, "secret name or ID not specified")?;
        self.client.delete(ctx, url).await
    }
}
