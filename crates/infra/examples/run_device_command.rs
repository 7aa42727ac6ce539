//! Example: run a shell command on the first online device
//!
//! ```bash
//! export SYNPSE_ACCESS_KEY=...
//! export SYNPSE_PROJECT_ID=...
//! cargo run -p synpse-infra --example run_device_command -- "uname -a"
//! ```

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use synpse_infra::api::{ApiClient, ApiCommands, ListDevicesRequest, RequestContext};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let command = std::env::args().nth(1).unwrap_or_else(|| "uptime".to_string());
    let client = ApiClient::from_env().context("failed to create Synpse client")?;
    let commands = ApiCommands::new(Arc::new(client));
    let ctx = RequestContext::new().with_timeout(Duration::from_secs(60));

    let page = commands.list_devices(&ctx, &ListDevicesRequest::default()).await?;
    let Some(device) = page.devices.iter().find(|device| device.is_online()) else {
        bail!("no online devices among {} listed", page.devices.len());
    };
    tracing::info!(device = %device.name, %command, "Running command");

    let output = commands.run_device_command(&ctx, &device.id, &command).await?;
    print!("{output}");

    Ok(())
}
