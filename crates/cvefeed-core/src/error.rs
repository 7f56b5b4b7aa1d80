//! Error types for the CVE Feed service

use thiserror::Error;

/// Result type alias using the cvefeed Error
pub type Result<T> = std::result::Result<T, Error>;

/// cvefeed error types
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid sort field: {field} (valid fields: baseScore, publishedDate, lastModifiedDate)")]
    InvalidSortField { field: String },

    // === Lookup Errors ===
    #[error("CVE not found: {id}")]
    NotFound { id: String },

    #[error("CVE already exists: {id}")]
    Conflict { id: String },

    // === Store Errors ===
    #[error("Store error: {0}")]
    Store(String),

    #[error("Store operation timed out")]
    StoreTimeout,

    // === Feed Errors ===
    #[error("Feed fetch failed: {0}")]
    FeedFailed(String),

    #[error("Parse error: {0}")]
    Parse(String),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Configuration(String),

    // === IO / Serialization ===
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Check if this error is transient and safe to retry
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::StoreTimeout | Error::FeedFailed(_) | Error::Store(_)
        )
    }

    /// Get an error code for logging and response bodies
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::MissingField { .. } => "MISSING_FIELD",
            Error::InvalidSortField { .. } => "INVALID_SORT_FIELD",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Conflict { .. } => "CONFLICT",
            Error::Store(_) => "STORE_ERROR",
            Error::StoreTimeout => "STORE_TIMEOUT",
            Error::FeedFailed(_) => "FEED_FAILED",
            Error::Parse(_) => "PARSE_ERROR",
            Error::Configuration(_) => "CONFIG_ERROR",
            Error::Io(_) => "IO_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classes() {
        assert!(Error::StoreTimeout.is_retryable());
        assert!(Error::FeedFailed(String::from("503")).is_retryable());
        assert!(!Error::NotFound { id: String::from("CVE-1999-0001") }.is_retryable());
        assert!(!Error::InvalidInput(String::from("bad page")).is_retryable());
    }

    #[test]
    fn test_invalid_sort_field_lists_valid_set() {
        let err = Error::InvalidSortField { field: String::from("foo") };
        let msg = err.to_string();
        assert!(msg.contains("baseScore"));
        assert!(msg.contains("publishedDate"));
        assert!(msg.contains("lastModifiedDate"));
    }
}
