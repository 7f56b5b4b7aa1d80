//! Read-side service over the CVE store

use cvefeed_core::{
    CveRecord, CveStore, Error, Predicate, Result, SearchResult, SortField, SortOrder,
};
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

/// Pagination and sorting parameters as they arrive from the caller
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// 1-based page number; default 1
    pub page: Option<i64>,
    /// Page size; default 10
    pub limit: Option<i64>,
    /// Sort field name; default "publishedDate"
    pub sort: Option<String>,
    /// "asc" or "desc"; default "desc", unrecognized values sort ascending
    pub order: Option<String>,
}

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 10;

/// Query operations over the store. Read-only apart from `add`.
pub struct QueryService {
    store: Arc<dyn CveStore>,
}

impl QueryService {
    pub fn new(store: Arc<dyn CveStore>) -> Self {
        Self { store }
    }

    /// Fetch one record or `NotFound`
    pub fn get_by_id(&self, id: &str) -> Result<CveRecord> {
        self.store
            .get(id)?
            .ok_or_else(|| Error::NotFound { id: id.to_string() })
    }

    /// All matches, no ordering guarantee
    pub fn list(&self, predicate: &Predicate) -> Result<Vec<CveRecord>> {
        self.store.find(predicate)
    }

    /// Paged, sorted search with result metadata.
    ///
    /// `total_results` counts matches before pagination; `total_pages` is
    /// `ceil(total_results / limit)`.
    pub fn search(&self, predicate: &Predicate, opts: &SearchOptions) -> Result<SearchResult> {
        let page = match opts.page {
            None => DEFAULT_PAGE,
            Some(p) if p >= 1 => p as u64,
            Some(p) => {
                return Err(Error::InvalidInput(format!("page must be >= 1, got {p}")));
            }
        };
        let limit = match opts.limit {
            None => DEFAULT_LIMIT,
            Some(l) if l >= 1 => l as u64,
            Some(l) => {
                return Err(Error::InvalidInput(format!("limit must be >= 1, got {l}")));
            }
        };
        let sort = match opts.sort.as_deref() {
            None => SortField::PublishedDate,
            Some(name) => SortField::from_str(name)?,
        };
        let order = SortOrder::from_param(opts.order.as_deref());

        let total_results = self.store.count(predicate)?;
        let total_pages = total_results.div_ceil(limit);
        let offset = (page - 1).checked_mul(limit).ok_or_else(|| {
            Error::InvalidInput(format!("page {page} with limit {limit} is out of range"))
        })?;
        debug!(page, limit, total_results, "search");

        let data = self.store.find_page(predicate, sort, order, offset, limit)?;

        Ok(SearchResult {
            page,
            limit,
            total_results,
            total_pages,
            data,
        })
    }

    /// Manual record submission. Conflicts on an existing id; never overwrites.
    pub fn add(&self, record: CveRecord) -> Result<CveRecord> {
        record.validate()?;
        if !self.store.insert_if_absent(&record)? {
            return Err(Error::Conflict { id: record.id });
        }
        Ok(record)
    }
}
