use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the extraction backend, without a trailing slash.
    pub backend_url: String,
    /// Bearer token attached to every request when present.
    pub api_token: Option<String>,
    pub request_timeout_secs: u64,
    /// Directory export files are written into.
    pub export_dir: String,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            backend_url: require_env("CVDESK_BACKEND_URL")
                .map(|u| u.trim_end_matches('/').to_string())?,
            api_token: std::env::var("CVDESK_API_TOKEN").ok().filter(|t| !t.is_empty()),
            request_timeout_secs: std::env::var("CVDESK_REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse::<u64>()
                .context("CVDESK_REQUEST_TIMEOUT_SECS must be a number of seconds")?,
            export_dir: std::env::var("CVDESK_EXPORT_DIR")
                .unwrap_or_else(|_| "exports".to_string()),
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
