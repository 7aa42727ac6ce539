use reqwest::Method;
use synpse_domain::{Application, DeviceApplicationStatus, LogsOptions};
use tracing::{debug, instrument};

use super::{require, ApiCommands};
use crate::api::context::RequestContext;
use crate::api::errors::ApiError;
use crate::tunnel::DeviceTunnel;

impl ApiCommands {
    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx, application), fields(name = %application.name))]
    pub async fn create_application(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        application: &Application,
    ) -> Result<Application, ApiError> {
        let url = self.namespace_url(namespace, &["applications"])?;
        let created: Application =
            self.client.send_json(ctx, Method::POST, url, application, "application").await?;

        debug!(application_id = %created.id, "Application created");
        Ok(created)
    }

    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn list_applications(
        &self,
        ctx: &RequestContext,
        namespace: &str,
    ) -> Result<Vec<Application>, ApiError> {
        let url = self.namespace_url(namespace, &["applications"])?;
        self.client.get_json(ctx, url, "applications").await
    }

    /// Get an application by name or ID
    ///
    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn get_application(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<Application, ApiError> {
        let url = self.namespace_url(namespace, &["applications", name])?;
        require(name, ApiError::APPLICATION_NOT_SELECTED)?;
        self.client.get_json(ctx, url, "application").await
    }

    /// Patch an application, addressed by its name
    ///
    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx, application), fields(name = %application.name))]
    pub async fn update_application(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        application: &Application,
    ) -> Result<Application, ApiError> {
        let url = self.namespace_url(namespace, &["applications", &application.name])?;
        require(&application.name, ApiError::APPLICATION_NOT_SELECTED)?;
        self.client.send_json(ctx, Method::PATCH, url, application, "application").await
    }

    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn delete_application(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        let url = self.namespace_url(namespace, &["applications", name])?;
        require(name, ApiError::APPLICATION_NOT_SELECTED)?;
        self.client.delete(ctx, url).await
    }

    /// Where an application runs and how each of its containers is doing
    ///
    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn list_application_allocations(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        application: &str,
    ) -> Result<Vec<DeviceApplicationStatus>, ApiError> {
        let url = self.namespace_url(namespace, &["applications", application, "allocations"])?;
        require(application, ApiError::APPLICATION_NOT_SELECTED)?;
        self.client.get_json(ctx, url, "application allocations").await
    }

    /// Stream logs of an application on one device.
    ///
    /// `options.container` narrows the stream to one container when set.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::application_logs`](crate::api::ApiClient::application_logs)
    pub async fn application_logs(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        application: &str,
        options: &LogsOptions,
    ) -> Result<DeviceTunnel, ApiError> {
        let container = Some(options.container.as_str()).filter(|c| !c.is_empty());
        self.client.application_logs(ctx, namespace, application, container, options).await
    }
}
