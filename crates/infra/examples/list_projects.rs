//! Example: list every project the access key belongs to
//!
//! ```bash
//! export SYNPSE_ACCESS_KEY=...
//! cargo run -p synpse-infra --example list_projects
//! ```

use std::sync::Arc;

use anyhow::Context;
use synpse_infra::api::{ApiClient, ApiCommands, RequestContext};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let client = ApiClient::from_env().context("failed to create Synpse client")?;
    let commands = ApiCommands::new(Arc::new(client));

    let projects = commands.list_projects(&RequestContext::new()).await?;
    for project in &projects {
        println!(
            "{:<24} {:<36} devices={} applications={}",
            project.name, project.id, project.device_count, project.application_count
        );
    }
    println!("{} project(s)", projects.len());

    Ok(())
}
