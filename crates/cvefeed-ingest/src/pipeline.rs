//! Idempotent ingestion pipeline: feed page -> normalize -> insert-if-absent

use crate::feed::FeedClient;
use cvefeed_core::{normalize, CveStore, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Outcome counters for one ingestion run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Raw items received from the feed
    pub fetched: u32,
    /// Records inserted into the store
    pub inserted: u32,
    /// Records whose id already existed
    pub skipped_duplicates: u32,
    /// Records that failed normalization
    pub skipped_invalid: u32,
}

impl IngestReport {
    fn merge(&mut self, other: IngestReport) {
        self.fetched += other.fetched;
        self.inserted += other.inserted;
        self.skipped_duplicates += other.skipped_duplicates;
        self.skipped_invalid += other.skipped_invalid;
    }
}

/// Batch ingestion job. Single-writer: the design assumes at most one run
/// active at a time, with the store's unique key as the backstop.
pub struct IngestPipeline {
    feed: Arc<dyn FeedClient>,
    store: Arc<dyn CveStore>,
    page_delay: Duration,
}

impl IngestPipeline {
    pub fn new(feed: Arc<dyn FeedClient>, store: Arc<dyn CveStore>) -> Self {
        Self {
            feed,
            store,
            page_delay: Duration::from_secs(6),
        }
    }

    /// Set the delay slept between pages during a full sync
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    /// Ingest one page of the feed.
    ///
    /// A bad record never aborts the batch: normalization failures and
    /// duplicates are counted and skipped.
    pub async fn ingest(&self, start_index: u32, page_size: u32) -> Result<IngestReport> {
        let page = self.feed.fetch_page(start_index, page_size).await?;
        let mut report = IngestReport::default();
        report.fetched = page.vulnerabilities.len() as u32;

        for raw in &page.vulnerabilities {
            let record = match normalize(raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(
                        id = raw.cve.id.as_deref().unwrap_or("<missing>"),
                        "Skipping invalid record: {}", e
                    );
                    report.skipped_invalid += 1;
                    continue;
                }
            };

            if self.store.contains(&record.id)? {
                debug!(id = %record.id, "Skipping duplicate CVE");
                report.skipped_duplicates += 1;
                continue;
            }

            // A concurrent run may have inserted the id between the existence
            // check and here; the unique key turns that race into a skip.
            if self.store.insert_if_absent(&record)? {
                report.inserted += 1;
            } else {
                report.skipped_duplicates += 1;
            }
        }

        info!(
            fetched = report.fetched,
            inserted = report.inserted,
            duplicates = report.skipped_duplicates,
            invalid = report.skipped_invalid,
            "Ingested feed page at index {}", start_index
        );
        Ok(report)
    }

    /// Walk the whole feed page by page, sleeping between requests.
    pub async fn sync_all(&self, page_size: u32) -> Result<IngestReport> {
        info!("Starting full feed sync...");
        let mut report = IngestReport::default();
        let mut start_index = 0u32;

        loop {
            let page = self.feed.fetch_page(start_index, page_size).await?;
            let total = page.total_results;
            let step = page.results_per_page.max(1);

            let mut page_report = IngestReport::default();
            page_report.fetched = page.vulnerabilities.len() as u32;
            for raw in &page.vulnerabilities {
                match normalize(raw) {
                    Ok(record) => {
                        if self.store.contains(&record.id)? || !self.store.insert_if_absent(&record)? {
                            page_report.skipped_duplicates += 1;
                        } else {
                            page_report.inserted += 1;
                        }
                    }
                    Err(e) => {
                        warn!("Skipping invalid record: {}", e);
                        page_report.skipped_invalid += 1;
                    }
                }
            }
            report.merge(page_report);

            start_index += step;
            info!("Processed {}/{} feed items", start_index.min(total), total);

            if start_index >= total {
                break;
            }
            tokio::time::sleep(self.page_delay).await;
        }

        info!(
            inserted = report.inserted,
            duplicates = report.skipped_duplicates,
            invalid = report.skipped_invalid,
            "Full sync complete; store now holds {} records",
            self.store.len()?
        );
        Ok(report)
    }
}
