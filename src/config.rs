use config::{Config, ConfigError};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub http: HttpConfig,
    pub scraper: ScraperConfig,
    pub input: InputConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScraperConfig {
    /// Concurrent business walks. Kept small to stay under the site's
    /// informal rate limits.
    pub concurrency: usize,
    pub max_pages: u32,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    /// Minimum spacing between any two fetches across all workers.
    pub min_fetch_interval_ms: u64,
    pub min_rating: Option<u8>,
    pub max_rating: Option<u8>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub url_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub directory: String,
    pub file_name: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(config::File::with_name("config/default.yaml"))
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let config = builder.build()?;

        if let Ok(headers) = config.get_table("http.headers") {
            debug!(?headers, "Loaded HTTP headers from configuration");
        }

        let settings: Settings = config.try_deserialize()?;

        debug!(
            concurrency = settings.scraper.concurrency,
            max_pages = settings.scraper.max_pages,
            "Parsed scraper settings"
        );

        Ok(settings)
    }
}
