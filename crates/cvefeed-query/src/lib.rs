//! CVE Feed Query - the read-side service
//!
//! `QueryService` combines predicates with the pagination and sorting
//! contract and translates store failures into the service error taxonomy.

pub mod service;

pub use service::{QueryService, SearchOptions, DEFAULT_LIMIT, DEFAULT_PAGE};
