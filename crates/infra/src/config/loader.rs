//! Client settings loader
//!
//! Loads [`ClientSettings`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `SYNPSE_ACCESS_KEY` is missing, falls back to a settings file
//! 3. Probes a few well-known paths for that file
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `SYNPSE_ACCESS_KEY`: API access key (required)
//! - `SYNPSE_PROJECT_ID`: Project used by project-scoped calls
//! - `SYNPSE_API_URL`: API root, defaults to the hosted service
//! - `SYNPSE_USER_AGENT`: User agent sent with every request
//! - `SYNPSE_REQUEST_TIMEOUT_MS`: Per-attempt HTTP timeout
//! - `SYNPSE_MAX_RETRIES`: Retries after the first attempt
//! - `SYNPSE_MIN_RETRY_DELAY_MS` / `SYNPSE_MAX_RETRY_DELAY_MS`: Backoff bounds
//! - `SYNPSE_RATE_LIMIT_RPS` / `SYNPSE_RATE_LIMIT_BURST`: Client-side rate
//!
//! ## File Locations
//! The loader probes, in order, `synpse.json` and `synpse.toml` in the
//! current directory, in `$HOME/.synpse/`, and next to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use synpse_domain::{ClientSettings, DomainError, Result};

/// Required variable holding the access key
pub const ENV_ACCESS_KEY: &str = "SYNPSE_ACCESS_KEY";
pub const ENV_PROJECT_ID: &str = "SYNPSE_PROJECT_ID";
pub const ENV_API_URL: &str = "SYNPSE_API_URL";
pub const ENV_USER_AGENT: &str = "SYNPSE_USER_AGENT";
pub const ENV_REQUEST_TIMEOUT_MS: &str = "SYNPSE_REQUEST_TIMEOUT_MS";
pub const ENV_MAX_RETRIES: &str = "SYNPSE_MAX_RETRIES";
pub const ENV_MIN_RETRY_DELAY_MS: &str = "SYNPSE_MIN_RETRY_DELAY_MS";
pub const ENV_MAX_RETRY_DELAY_MS: &str = "SYNPSE_MAX_RETRY_DELAY_MS";
pub const ENV_RATE_LIMIT_RPS: &str = "SYNPSE_RATE_LIMIT_RPS";
pub const ENV_RATE_LIMIT_BURST: &str = "SYNPSE_RATE_LIMIT_BURST";

const FILE_STEM: &str = "synpse";

/// Load settings with automatic fallback strategy
///
/// First attempts to load from environment variables. If the access key
/// variable is missing, falls back to loading from a settings file.
///
/// # Errors
/// Returns `DomainError::Config` if:
/// - Settings cannot be loaded from either source
/// - A variable or the file has an invalid value
pub fn load() -> Result<ClientSettings> {
    match load_from_env() {
        Ok(settings) => {
            tracing::info!("Client settings loaded from environment variables");
            Ok(settings)
        }
        Err(e) if std::env::var_os(ENV_ACCESS_KEY).is_none() => {
            tracing::debug!(error = %e, "No access key in environment, trying file");
            load_from_file(None)
        }
        Err(e) => Err(e),
    }
}

/// Load settings from `SYNPSE_*` environment variables
///
/// Unset optional variables keep their defaults.
///
/// # Errors
/// Returns `DomainError::Config` if `SYNPSE_ACCESS_KEY` is missing or any
/// variable has an invalid value.
pub fn load_from_env() -> Result<ClientSettings> {
    let mut settings = ClientSettings::with_access_key(env_var(ENV_ACCESS_KEY)?);

    if let Some(project_id) = optional_var(ENV_PROJECT_ID) {
        settings.project_id = Some(project_id);
    }
    if let Some(api_url) = optional_var(ENV_API_URL) {
        settings.api_url = api_url;
    }
    if let Some(user_agent) = optional_var(ENV_USER_AGENT) {
        settings.user_agent = user_agent;
    }
    if let Some(timeout) = env_parse(ENV_REQUEST_TIMEOUT_MS)? {
        settings.request_timeout_ms = Some(timeout);
    }
    if let Some(max_retries) = env_parse(ENV_MAX_RETRIES)? {
        settings.retry.max_retries = max_retries;
    }
    if let Some(delay) = env_parse(ENV_MIN_RETRY_DELAY_MS)? {
        settings.retry.min_retry_delay_ms = delay;
    }
    if let Some(delay) = env_parse(ENV_MAX_RETRY_DELAY_MS)? {
        settings.retry.max_retry_delay_ms = delay;
    }
    if let Some(rps) = env_parse(ENV_RATE_LIMIT_RPS)? {
        settings.rate_limit.requests_per_second = rps;
    }
    if let Some(burst) = env_parse(ENV_RATE_LIMIT_BURST)? {
        settings.rate_limit.burst = burst;
    }

    settings.validate()?;
    Ok(settings)
}

/// Load settings from a file
///
/// If `path` is `None`, probes the standard locations. Format is detected by
/// extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `DomainError::Config` if:
/// - The file does not exist or none was found
/// - The file cannot be parsed
/// - The settings fail validation
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientSettings> {
    let settings_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DomainError::Config(format!(
                    "Settings file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DomainError::Config("No settings file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %settings_path.display(), "Loading client settings from file");

    let contents = std::fs::read_to_string(&settings_path)
        .map_err(|e| DomainError::Config(format!("Failed to read settings file: {e}")))?;

    let settings = parse_settings(&contents, &settings_path)?;
    settings.validate()?;
    Ok(settings)
}

fn parse_settings(contents: &str, path: &Path) -> Result<ClientSettings> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DomainError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| DomainError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(DomainError::Config(format!("Unsupported settings format: {extension}"))),
    }
}

/// Probe the standard locations for a settings file
///
/// Looks for `synpse.json` then `synpse.toml` in:
/// 1. The current working directory
/// 2. `$HOME/.synpse/`
/// 3. The directory of the running executable
///
/// # Returns
/// The first file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home).join(".synpse"));
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        dirs.push(exe_dir);
    }

    dirs.iter()
        .flat_map(|dir| ["json", "toml"].map(|ext| dir.join(format!("{FILE_STEM}.{ext}"))))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    optional_var(key).ok_or_else(|| {
        DomainError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Set and non-empty
fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    optional_var(key)
        .map(|value| {
            value
                .trim()
                .parse::<T>()
                .map_err(|e| DomainError::Config(format!("Invalid value for {key}: {e}")))
        })
        .transpose()
}
