use reqwest::Method;
use synpse_domain::{Membership, Project};
use tracing::{debug, instrument};

use super::ApiCommands;
use crate::api::context::RequestContext;
use crate::api::errors::ApiError;

impl ApiCommands {
    /// Create a project owned by the caller
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self, ctx, project), fields(name = %project.name))]
    pub async fn create_project(
        &self,
        ctx: &RequestContext,
        project: &Project,
    ) -> Result<Project, ApiError> {
        let url = self.client.url(&["projects"])?;
        let created: Project =
            self.client.send_json(ctx, Method::POST, url, project, "project").await?;

        debug!(project_id = %created.id, "Project created");
        Ok(created)
    }

    /// Projects the caller is a member of.
    ///
    /// Only works with personal access keys, not with service accounts
    /// scoped to a single project.
    ///
    /// # Errors
    ///
    /// Returns error if the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn list_projects(&self, ctx: &RequestContext) -> Result<Vec<Project>, ApiError> {
        let mut url = self.client.url(&["memberships"])?;
        url.set_query(Some("full"));
        let memberships: Vec<Membership> = self.client.get_json(ctx, url, "memberships").await?;

        debug!(count = memberships.len(), "Projects listed");
        Ok(memberships.into_iter().map(|membership| membership.project).collect())
    }
}
