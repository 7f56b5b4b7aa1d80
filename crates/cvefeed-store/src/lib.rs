//! CVE Feed Store - SQLite-backed implementation of the `CveStore` capability
//!
//! Predicates built by `cvefeed-core` are compiled into parameterized WHERE
//! clauses here; timestamps are stored as unix milliseconds so range
//! comparisons stay index-friendly without losing the sub-second precision
//! upstream feed dates carry.

pub mod database;

pub use database::CveDb;
