//! Configuration management for CVE Feed components

use cvefeed_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Store settings
    #[serde(default)]
    pub store: StoreConfig,

    /// Upstream feed settings
    #[serde(default)]
    pub feed: FeedConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read config file {:?}: {}", path, e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {}", e)))
    }

    /// Merge with environment variables (CVEFEED_ prefix)
    pub fn merge_env(mut self) -> Self {
        if let Ok(val) = std::env::var("CVEFEED_BIND_ADDR") {
            self.server.bind_addr = val;
        }
        if let Ok(val) = std::env::var("CVEFEED_DB_PATH") {
            self.store.database_path = val;
        }
        if let Ok(val) = std::env::var("CVEFEED_FEED_URL") {
            self.feed.api_url = val;
        }
        if let Ok(val) = std::env::var("CVEFEED_FEED_API_KEY") {
            self.feed.api_key = Some(val);
        }
        if let Ok(val) = std::env::var("CVEFEED_FEED_PAGE_SIZE") {
            if let Ok(n) = val.parse() {
                self.feed.page_size = n;
            }
        }
        if let Ok(val) = std::env::var("CVEFEED_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("CVEFEED_LOG_FORMAT") {
            self.logging.format = val;
        }
        self
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

fn default_bind_addr() -> String {
    String::from("0.0.0.0:8080")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub database_path: String,
}

fn default_db_path() -> String {
    String::from("/var/lib/cvefeed/cves.db")
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            database_path: default_db_path(),
        }
    }
}

/// Upstream feed configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// NVD API URL
    #[serde(default = "default_feed_url")]
    pub api_url: String,

    /// NVD API key (optional, for higher rate limits)
    pub api_key: Option<String>,

    /// Items requested per feed page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Delay between page requests in milliseconds; when unset the client
    /// derives it from the NVD rate limits
    pub request_delay_ms: Option<u64>,
}

fn default_feed_url() -> String {
    String::from("https://services.nvd.nist.gov/rest/json/cves/2.0")
}

fn default_page_size() -> u32 {
    2000
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            api_url: default_feed_url(),
            api_key: None,
            page_size: default_page_size(),
            request_delay_ms: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (pretty, json, compact)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    String::from("info")
}

fn default_log_format() -> String {
    String::from("pretty")
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}
