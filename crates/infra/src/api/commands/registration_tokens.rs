use reqwest::Method;
use synpse_domain::DeviceRegistrationToken;
use tracing::{debug, instrument};

use super::{require, ApiCommands};
use crate::api::context::RequestContext;
use crate::api::errors::ApiError;

const TOKENS: &str = "device-registration-tokens";
const TOKEN_ID_REQUIRED: &str = "registration token ID not specified";

impl ApiCommands {
    /// # Errors
    ///
    /// Returns error if no project is configured or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn list_registration_tokens(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<DeviceRegistrationToken>, ApiError> {
        let url = self.project_url(&[TOKENS])?;
        self.client.get_json(ctx, url, "registration tokens").await
    }

    /// # Errors
    ///
    /// Returns error if no project is configured or the API request fails
    #[instrument(skip(self, ctx, token), fields(name = %token.name))]
    pub async fn create_registration_token(
        &self,
        ctx: &RequestContext,
        token: &DeviceRegistrationToken,
    ) -> Result<DeviceRegistrationToken, ApiError> {
        let url = self.project_url(&[TOKENS])?;
        let created: DeviceRegistrationToken =
            self.client.send_json(ctx, Method::POST, url, token, "registration token").await?;

        debug!(token_id = %created.id, "Registration token created");
        Ok(created)
    }

    /// Replace a registration token, addressed by its ID
    ///
    /// # Errors
    ///
    /// Returns error if the ID is empty or the API request fails
    #[instrument(skip(self, ctx, token), fields(token_id = %token.id))]
    pub async fn update_registration_token(
        &self,
        ctx: &RequestContext,
        token: &DeviceRegistrationToken,
    ) -> Result<DeviceRegistrationToken, ApiError> {
        require(&token.id, TOKEN_ID_REQUIRED)?;
        let url = self.project_url(&[TOKENS, &token.id])?;
        self.client.send_json(ctx, Method::PUT, url, token, "registration token").await
    }

    /// # Errors
    ///
    /// Returns error if the ID is empty or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn delete_registration_token(
        &self,
        ctx: &RequestContext,
        token_id: &str,
    ) -> Result<(), ApiError> {
        require(token_id, TOKEN_ID_REQUIRED)?;
        let url = self.project_url(&[TOKENS, token_id])?;
        self.client.delete(ctx, url).await
    }

    /// The project's default registration token
    ///
    /// # Errors
    ///
    /// Returns error if no project is configured, the API request fails or
    /// the reply is not a single token
    #[instrument(skip(self, ctx))]
    pub async fn default_registration_token(
        &self,
        ctx: &RequestContext,
    ) -> Result<DeviceRegistrationToken, ApiError> {
        let url = self.project_url(&[TOKENS])?;
        self.client.get_json(ctx, url, "registration token").await
    }
}
