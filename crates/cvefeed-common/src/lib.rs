//! CVE Feed Common - shared configuration and logging
//!
//! This crate provides the ambient plumbing used by the server binary:
//! TOML configuration with `CVEFEED_*` environment overrides, and tracing
//! subscriber setup.

pub mod config;
pub mod logging;

pub use config::{Config, FeedConfig, LoggingConfig, ServerConfig, StoreConfig};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogFormat};
