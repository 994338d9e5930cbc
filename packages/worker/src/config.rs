//! Environment-driven configuration. No module-level singletons: the config
//! is loaded once in `main` and everything downstream receives what it needs
//! through `WorkerDeps`.

use anyhow::{Context, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,

    /// Places API
    pub places_api_key: String,
    pub places_base_url: String,

    /// Page-quality audit tool API
    pub audit_tool_base_url: String,
    pub audit_tool_api_key: Option<String>,

    /// Object storage for screenshots
    pub screenshot_bucket: String,

    /// Queue tuning
    pub worker_batch_size: i64,
    pub poll_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is required")?,
            places_api_key: std::env::var("PLACES_API_KEY")
                .context("PLACES_API_KEY is required")?,
            places_base_url: std::env::var("PLACES_BASE_URL")
                .unwrap_or_else(|_| "https://maps.googleapis.com/maps/api".to_string()),
            audit_tool_base_url: std::env::var("AUDIT_TOOL_BASE_URL").unwrap_or_else(|_| {
                "https://www.googleapis.com/pagespeedonline/v5/runPagespeed".to_string()
            }),
            audit_tool_api_key: std::env::var("AUDIT_TOOL_API_KEY").ok(),
            screenshot_bucket: std::env::var("SCREENSHOT_BUCKET")
                .context("SCREENSHOT_BUCKET is required")?,
            worker_batch_size: std::env::var("WORKER_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            poll_interval_secs: std::env::var("POLL_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
        })
    }
}
