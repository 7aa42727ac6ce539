use std::collections::BTreeMap;

use reqwest::Method;
use synpse_domain::{Device, Pagination, PaginationOptions};
use tracing::{debug, instrument};

use super::ApiCommands;
use crate::api::context::RequestContext;
use crate::api::errors::ApiError;
use crate::http::ApiRequest;
use crate::ssh::DeviceSshSession;
use crate::tunnel::DeviceTunnel;

/// Filters for [`ApiCommands::list_devices`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListDevicesRequest {
    /// Free text search, e.g. `power-plant-one`
    pub search_query: String,
    /// Devices must carry all of these labels
    pub labels: BTreeMap<String, String>,
    pub pagination: PaginationOptions,
}

/// One page of devices
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceList {
    pub devices: Vec<Device>,
    pub pagination: Pagination,
}

impl ApiCommands {
    /// # Errors
    ///
    /// Returns error if no project is configured or the API request fails
    #[instrument(skip(self, ctx, request), fields(q = %request.search_query))]
    pub async fn list_devices(
        &self,
        ctx: &RequestContext,
        request: &ListDevicesRequest,
    ) -> Result<DeviceList, ApiError> {
        let mut url = self.project_url(&["devices"])?;
        {
            let mut query = url.query_pairs_mut();
            if !request.search_query.is_empty() {
                query.append_pair("q", &request.search_query);
            }
            if !request.labels.is_empty() {
                let labels = serde_json::to_string(&request.labels).map_err(ApiError::Serialize)?;
                query.append_pair("labels", &labels);
            }
            query.extend_pairs(request.pagination.query_pairs());
        }
        if url.query() == Some("") {
            url.set_query(None);
        }

        let response = self.client.execute(ctx, ApiRequest::new(Method::GET, url)).await?;
        let devices: Vec<Device> = response.json("devices")?;

        debug!(count = devices.len(), "Devices listed");
        Ok(DeviceList { devices, pagination: response.pagination() })
    }

    /// Full view of one device, including its applications
    ///
    /// # Errors
    ///
    /// Returns error if no project is configured or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn get_device(&self, ctx: &RequestContext, device: &str) -> Result<Device, ApiError> {
        let mut url = self.project_url(&["devices", device])?;
        url.set_query(Some("full"));
        self.client.get_json(ctx, url, "device").await
    }

    /// Update name, labels, environment or desired agent version
    ///
    /// # Errors
    ///
    /// Returns error if no project is configured or the API request fails
    #[instrument(skip(self, ctx, device), fields(device_id = %device.id))]
    pub async fn update_device(
        &self,
        ctx: &RequestContext,
        device: &Device,
    ) -> Result<Device, ApiError> {
        let url = self.project_url(&["devices", &device.id])?;
        self.client.send_json(ctx, Method::PATCH, url, device, "device").await
    }

    /// # Errors
    ///
    /// Returns error if no project is configured or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn delete_device(&self, ctx: &RequestContext, device: &str) -> Result<(), ApiError> {
        let url = self.project_url(&["devices", device])?;
        self.client.delete(ctx, url).await
    }

    /// # Errors
    ///
    /// Returns error if no project is configured or the API request fails
    #[instrument(skip(self, ctx))]
    pub async fn reboot_device(&self, ctx: &RequestContext, device: &str) -> Result<(), ApiError> {
        let url = self.project_url(&["devices", device, "reboot"])?;
        let request = ApiRequest::new(Method::POST, url).with_raw_body(Vec::new());
        self.client.execute(ctx, request).await?;

        debug!("Device reboot requested");
        Ok(())
    }

    /// TCP tunnel to `hostname:port` reachable from the device
    ///
    /// # Errors
    ///
    /// See [`ApiClient::device_connect`](crate::api::ApiClient::device_connect)
    pub async fn device_connect(
        &self,
        ctx: &RequestContext,
        device: &str,
        port: u16,
        hostname: &str,
    ) -> Result<DeviceTunnel, ApiError> {
        self.client.device_connect(ctx, device, port, hostname).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::device_ssh`](crate::api::ApiClient::device_ssh)
    pub async fn device_ssh(
        &self,
        ctx: &RequestContext,
        device: &str,
    ) -> Result<DeviceSshSession, ApiError> {
        self.client.device_ssh(ctx, device).await
    }

    /// # Errors
    ///
    /// See [`ApiClient::run_device_command`](crate::api::ApiClient::run_device_command)
    pub async fn run_device_command(
        &self,
        ctx: &RequestContext,
        device: &str,
        command: &str,
    ) -> Result<String, ApiError> {
        self.client.run_device_command(ctx, device, command).await
    }
}
