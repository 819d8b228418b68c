use std::env;

use crate::types::BoundingBox;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Vendor traffic feed
    pub vendor_base_url: String,
    pub vendor_api_key: String,
    pub vendor_timeout_secs: u64,
    pub vendor_max_results: u32,

    // Sync job
    pub coverage_bbox: BoundingBox,
    pub sync_interval_secs: u64,

    // Web server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing or malformed.
    pub fn from_env() -> Self {
        let bbox_raw = required_env("COVERAGE_BBOX");
        let coverage_bbox = BoundingBox::parse(&bbox_raw)
            .unwrap_or_else(|e| panic!("COVERAGE_BBOX is invalid: {e}"));

        Self {
            database_url: required_env("DATABASE_URL"),
            vendor_base_url: required_env("VENDOR_BASE_URL"),
            vendor_api_key: required_env("VENDOR_API_KEY"),
            vendor_timeout_secs: env_or("VENDOR_TIMEOUT_SECS", "20"),
            vendor_max_results: env_or("VENDOR_MAX_RESULTS", "200"),
            coverage_bbox,
            sync_interval_secs: env_or("SYNC_INTERVAL_SECS", "300"),
            web_host: env::var("WEB_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            web_port: env_or("WEB_PORT", "3000"),
        }
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn env_or<T: std::str::FromStr>(key: &str, default: &str) -> T {
    env::var(key)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .unwrap_or_else(|_| panic!("{key} must be a number"))
}
