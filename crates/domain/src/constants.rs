//! API constants
//!
//! Defaults shared by the client and its configuration loader.

/// Public cloud API endpoint
pub const DEFAULT_API_URL: &str = "https://cloud.synpse.net/api";

/// User agent sent when none is configured
pub const DEFAULT_USER_AGENT: &str = "synpse-rs/v1";

/// Header carrying the per-attempt client request id
pub const CLIENT_REQUEST_ID_HEADER: &str = "synpse-client-request-id";

// Retry defaults
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_MIN_RETRY_DELAY_MS: u64 = 1_000;
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 30_000;

// 4 rps matches the server-side limit of 1200 requests per 5 minutes
pub const DEFAULT_REQUESTS_PER_SECOND: f64 = 4.0;
pub const DEFAULT_RATE_LIMIT_BURST: u64 = 1;

// Pagination
pub const DEFAULT_PAGE_SIZE: u32 = 100;
pub const MAX_PAGE_SIZE: u32 = 500;
