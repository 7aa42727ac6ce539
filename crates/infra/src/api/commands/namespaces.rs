use reqwest::Method;
use synpse_domain::Namespace;
use tracing::{debug, instrument};

use super::{require, ApiCommands};
use crate::api::context::RequestContext;
use crate::api::errors::ApiError;

impl ApiCommands {
    /// # Errors
    ///
    /// Returns error if no project is configured or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn list_namespaces(&self, ctx: &RequestContext) -> Result<Vec<Namespace>, ApiError> {
        let url = self.project_url(&["namespaces"])?;
        self.client.get_json(ctx, url, "namespaces").await
    }

    /// # Errors
    ///
    /// Returns error if no project is configured or the API request fails
    #[instrument(skip(self, ctx, namespace), fields(name = %namespace.name))]
    pub async fn create_namespace(
        &self,
        ctx: &RequestContext,
        namespace: &Namespace,
    ) -> Result<Namespace, ApiError> {
        let url = self.project_url(&["namespaces"])?;
        let created: Namespace =
            self.client.send_json(ctx, Method::POST, url, namespace, "namespace").await?;

        debug!(namespace_id = %created.id, "Namespace created");
        Ok(created)
    }

    /// Get a namespace by name or ID
    ///
    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn get_namespace(
        &self,
        ctx: &RequestContext,
        namespace: &str,
    ) -> Result<Namespace, ApiError> {
        let url = self.namespace_url(namespace, &[])?;
        self.client.get_json(ctx, url, "namespace").await
    }

    /// Replace a namespace, addressed by its name
    ///
    /// # Errors
    ///
    /// Returns error if the name is empty or the API request fails
    #[instrument(skip(self, ctx, namespace), fields(name = %namespace.name))]
    pub async fn update_namespace(
        &self,
        ctx: &RequestContext,
        namespace: &Namespace,
    ) -> Result<Namespace, ApiError> {
        require(&namespace.name, "namespace name is required")?;
        let url = self.namespace_url(&namespace.name, &[])?;
        self.client.send_json(ctx, Method::PUT, url, namespace, "namespace").await
    }

    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn delete_namespace(
        &self,
        ctx: &RequestContext,
        namespace: &str,
    ) -> Result<(), ApiError> {
        let url = self.namespace_url(namespace, &[])?;
        self.client.delete(ctx, url).await?;

        debug!("Namespace deleted");
        Ok(())
    }
}
