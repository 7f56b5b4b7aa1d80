//! Store capability trait - what the query and ingestion layers need from a
//! document store, nothing more

use crate::error::Result;
use crate::query::{Predicate, SortField, SortOrder};
use crate::record::CveRecord;

/// Capability interface over the CVE collection.
///
/// Implementations provide their own concurrency control for reads; all
/// methods take `&self`. The unique key on `id` is the correctness backstop
/// against duplicate inserts from overlapping ingestion runs.
pub trait CveStore: Send + Sync {
    /// Fetch a record by id
    fn get(&self, id: &str) -> Result<Option<CveRecord>>;

    /// Check whether a record with this id exists
    fn contains(&self, id: &str) -> Result<bool>;

    /// All records matching the predicate, in no guaranteed order
    fn find(&self, predicate: &Predicate) -> Result<Vec<CveRecord>>;

    /// Number of records matching the predicate
    fn count(&self, predicate: &Predicate) -> Result<u64>;

    /// One sorted page of matches: skip `offset`, take `limit`
    fn find_page(
        &self,
        predicate: &Predicate,
        sort: SortField,
        order: SortOrder,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<CveRecord>>;

    /// Insert unless the id already exists. Returns `false` on duplicate;
    /// a duplicate is never an error and never an overwrite.
    fn insert_if_absent(&self, record: &CveRecord) -> Result<bool>;

    /// Total number of stored records
    fn len(&self) -> Result<u64>;

    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}
