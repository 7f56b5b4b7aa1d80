//! CVE Feed Core - record model, predicate builder, error taxonomy
//!
//! This crate provides the abstractions shared across the CVE Feed service:
//! - `CveRecord`: the canonical vulnerability record and its validation rules
//! - `Predicate`: composable filter expressions built from query parameters
//! - `CveStore`: the capability trait the store backend implements
//! - `Error`/`Result`: the error taxonomy every boundary translates into

pub mod error;
pub mod query;
pub mod record;
pub mod store;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use query::{
    Clause, Predicate, QueryRequest, SearchResult, SortField, SortOrder, DEFAULT_MODIFIED_DAYS,
};
pub use record::{normalize, parse_timestamp, CveRecord, RawSubmission, RawVulnerability};
pub use store::CveStore;
