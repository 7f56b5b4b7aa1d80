//! CVE Feed server - HTTP query API over ingested CVE records
//!
//! Two modes: `serve` runs the query API, `sync` runs one ingestion batch
//! (or a full feed walk) against the same store.

use anyhow::Result;
use clap::{Parser, Subcommand};
use cvefeed_common::{Config, LogConfig, LogFormat};
use cvefeed_ingest::{IngestPipeline, NvdFeed};
use cvefeed_query::QueryService;
use cvefeed_store::CveDb;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// CVE feed query API and ingestion job
#[derive(Parser, Debug)]
#[command(name = "cvefeed-server")]
#[command(version)]
#[command(about = "CVE feed query API and ingestion job", long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "/etc/cvefeed/config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error); overrides config
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (pretty, json, compact); overrides config
    #[arg(long)]
    log_format: Option<String>,

    /// SQLite database path; overrides config
    #[arg(long)]
    db_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP query API
    Serve {
        /// Bind address; overrides config
        #[arg(long)]
        bind: Option<String>,
    },
    /// Pull records from the upstream feed into the store
    Sync {
        /// Feed offset to start from
        #[arg(long, default_value_t = 0)]
        start_index: u32,

        /// Items per feed page; overrides config
        #[arg(long)]
        page_size: Option<u32>,

        /// Walk the entire feed instead of a single page
        #[arg(long)]
        full: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = if std::path::Path::new(&args.config).exists() {
        Config::from_file(&args.config)?
    } else {
        Config::default()
    };
    let mut config = config.merge_env();

    if let Some(path) = args.db_path {
        config.store.database_path = path;
    }

    let log_config = LogConfig::new()
        .level(args.log_level.unwrap_or_else(|| config.logging.level.clone()))
        .format(LogFormat::from_name(
            args.log_format.as_deref().unwrap_or(&config.logging.format),
        ));
    cvefeed_common::init_logging_with_config(log_config);

    info!("cvefeed-server {}", env!("CARGO_PKG_VERSION"));
    info!("Store: {}", config.store.database_path);

    let store = Arc::new(CveDb::open(&config.store.database_path)?);

    match args.command {
        Command::Serve { bind } => {
            let bind_addr = bind.unwrap_or_else(|| config.server.bind_addr.clone());
            let service = Arc::new(QueryService::new(store));
            let app = cvefeed_server::router(service);

            info!("Listening on {}", bind_addr);
            let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
            info!("Shut down");
        }
        Command::Sync { start_index, page_size, full } => {
            let feed = NvdFeed::new(&config.feed.api_url, config.feed.api_key.clone())?;
            let feed = match config.feed.request_delay_ms {
                Some(ms) => feed.with_request_delay(Duration::from_millis(ms)),
                None => feed,
            };
            let page_delay = feed.request_delay();
            let page_size = page_size.unwrap_or(config.feed.page_size);

            let pipeline =
                IngestPipeline::new(Arc::new(feed), store).with_page_delay(page_delay);

            let report = if full {
                pipeline.sync_all(page_size).await?
            } else {
                pipeline.ingest(start_index, page_size).await?
            };

            info!(
                fetched = report.fetched,
                inserted = report.inserted,
                duplicates = report.skipped_duplicates,
                invalid = report.skipped_invalid,
                "Sync finished"
            );
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
