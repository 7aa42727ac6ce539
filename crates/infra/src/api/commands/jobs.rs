use reqwest::Method;
use synpse_domain::{Job, LogsOptions};
use tracing::{debug, instrument};

use super::{require, ApiCommands};
use crate::api::context::RequestContext;
use crate::api::errors::ApiError;
use crate::tunnel::DeviceTunnel;

impl ApiCommands {
    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn list_jobs(
        &self,
        ctx: &RequestContext,
        namespace: &str,
    ) -> Result<Vec<Job>, ApiError> {
        let url = self.namespace_url(namespace, &["jobs"])?;
        self.client.get_json(ctx, url, "jobs").await
    }

    /// # Errors
    ///
    /// Returns error if the namespace is empty or the API request fails
    #[instrument(skip(self, ctx, job), fields(name = %job.name))]
    pub async fn create_job(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        job: &Job,
    ) -> Result<Job, ApiError> {
        let url = self.namespace_url(namespace, &["jobs"])?;
        let created: Job = self.client.send_json(ctx, Method::POST, url, job, "job").await?;

        debug!(job_id = %created.id, "Job created");
        Ok(created)
    }

    /// Get a job by name or ID
    ///
    /// # Errors
    ///
    /// Returns error if the namespace or name is empty or the API request
    /// fails
    #[instrument(skip(self, ctx))]
    pub async fn get_job(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<Job, ApiError> {
        let url = self.namespace_url(namespace, &["jobs", name])?;
        require(name, ApiError::JOB_NOT_SELECTED)?;
        self.client.get_json(ctx, url, "job").await
    }

    /// Patch a job, addressed by its ID or else its name
    ///
    /// # Errors
    ///
    /// Returns error if the job has neither ID nor name, the namespace is
    /// empty or the API request fails
    #[instrument(skip(self, ctx, job), fields(job = ?job.identifier()))]
    pub async fn update_job(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        job: &Job,
    ) -> Result<Job, ApiError> {
        let identifier = job.identifier().unwrap_or_default();
        let url = self.namespace_url(namespace, &["jobs", identifier])?;
        require(identifier, "job ID or name must be specified")?;
        self.client.send_json(ctx, Method::PATCH, url, job, "job").await
    }

    /// # Errors
    ///
    /// Returns error if the namespace or name is empty or the API request
    /// fails
    #[instrument(skip(self, ctx))]
    pub async fn delete_job(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        name: &str,
    ) -> Result<(), ApiError> {
        let url = self.namespace_url(namespace, &["jobs", name])?;
        require(name, ApiError::JOB_NOT_SELECTED)?;
        self.client.delete(ctx, url).await
    }

    /// Stream logs of a job on one device
    ///
    /// # Errors
    ///
    /// See [`ApiClient::job_logs`](crate::api::ApiClient::job_logs)
    pub async fn job_logs(
        &self,
        ctx: &RequestContext,
        namespace: &str,
        job: &str,
        options: &LogsOptions,
    ) -> Result<DeviceTunnel, ApiError> {
        self.client.job_logs(ctx, namespace, job, options).await
    }
}
