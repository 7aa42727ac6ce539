//! Example: show where an application runs and the state of its containers
//!
//! ```bash
//! export SYNPSE_ACCESS_KEY=...
//! export SYNPSE_PROJECT_ID=...
//! cargo run -p synpse-infra --example inspect_allocations -- default my-app
//! ```

use std::sync::Arc;

use anyhow::Context;
use synpse_infra::api::{ApiClient, ApiCommands, RequestContext};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let mut args = std::env::args().skip(1);
    let namespace = args.next().unwrap_or_else(|| "default".to_string());
    let application = args.next().context("usage: inspect_allocations <namespace> <app>")?;

    let client = ApiClient::from_env().context("failed to create Synpse client")?;
    let commands = ApiCommands::new(Arc::new(client));
    let ctx = RequestContext::new();

    let app = commands.get_application(&ctx, &namespace, &application).await?;
    let status = &app.deployment_status;
    println!(
        "{} ({}): {}/{} available, {} pending",
        app.name, app.id, status.available, status.total, status.pending
    );

    let allocations =
        commands.list_application_allocations(&ctx, &namespace, &application).await?;
    for allocation in allocations {
        let seen = allocation
            .last_seen
            .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
        println!("- {} ({}), last seen {seen}", allocation.device_name, allocation.device_id);
        for workload in &allocation.application_statuses {
            println!("    {:<20} {}", workload.name, workload.state);
        }
    }

    Ok(())
}
