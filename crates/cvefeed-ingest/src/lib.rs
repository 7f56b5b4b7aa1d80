//! CVE Feed Ingest - upstream feed client and batch ingestion
//!
//! This crate provides:
//! - `NvdFeed`: NVD API 2.0 paged client with rate-limit pacing
//! - `FeedClient`: the capability trait the pipeline consumes
//! - `IngestPipeline`: normalize + insert-if-absent with an `IngestReport`

pub mod feed;
pub mod pipeline;

pub use feed::{FeedClient, FeedPage, NvdFeed};
pub use pipeline::{IngestPipeline, IngestReport};
