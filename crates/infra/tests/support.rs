#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;

use synpse_common::observability::RecordingLogger;
use synpse_common::resilience::{RetryPolicy, Unlimited};
use synpse_infra::api::{ApiClient, ApiClientBuilder, ApiCommands};
use wiremock::MockServer;

pub const PROJECT: &str = "proj-1";
pub const ACCESS_KEY: &str = "key-1";
/// `Basic base64("key-1:")`
pub const BASIC_AUTH: &str = "Basic a2V5LTE6";

/// Install a test subscriber once per binary. `RUST_LOG` controls output.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Retry policy with no backoff so tests stay fast
pub fn instant_retries(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::ZERO, Duration::ZERO).expect("valid retry policy")
}

/// Builder pointed at `server`, unlimited rate and instant retries
pub fn builder_for(server: &MockServer) -> ApiClientBuilder {
    init_tracing();
    ApiClient::builder()
        .access_key(ACCESS_KEY)
        .base_url(format!("{}/api", server.uri()))
        .project_id(PROJECT)
        .rate_limiter(Arc::new(Unlimited))
        .retry_policy(instant_retries(3))
}

/// Client plus the logger it writes retry lines to
pub fn client_for(server: &MockServer) -> (Arc<ApiClient>, RecordingLogger) {
    let logger = RecordingLogger::new();
    let client = builder_for(server)
        .logger(Arc::new(logger.clone()))
        .build()
        .expect("client should build");
    (Arc::new(client), logger)
}

pub fn commands_for(server: &MockServer) -> ApiCommands {
    ApiCommands::new(client_for(server).0)
}

/// Path below the mock server's API root for the test project
pub fn project_path(rest: &str) -> String {
    format!("/api/projects/{PROJECT}/{rest}")
}
