//! CVE Feed Server library surface - the HTTP transport binding
//!
//! Exposed as a library so integration tests (and embedders) can build the
//! router over their own store.

pub mod routes;

pub use routes::{router, ApiError};
