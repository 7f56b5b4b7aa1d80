//! Query parameters, predicate builder, and search result shapes
//!
//! [`Predicate::build`] is a pure function translating one [`QueryRequest`]
//! into an AND of filter clauses. It performs no I/O; the store decides how
//! to evaluate the clauses.

use crate::error::{Error, Result};
use crate::record::CveRecord;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;
use std::str::FromStr;

/// Default lookback for the "recently modified" query mode, in days
pub const DEFAULT_MODIFIED_DAYS: i64 = 7;

/// Optional filter parameters for one API call. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub min_score: Option<f64>,
    pub max_score: Option<f64>,
    pub year: Option<i32>,
    pub modified_since_days: Option<i64>,
    pub keyword: Option<String>,
}

/// Fields the search endpoint may sort by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    BaseScore,
    PublishedDate,
    LastModifiedDate,
}

impl SortField {
    /// The external (API) name of the field
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::BaseScore => "baseScore",
            SortField::PublishedDate => "publishedDate",
            SortField::LastModifiedDate => "lastModifiedDate",
        }
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "baseScore" => Ok(SortField::BaseScore),
            "publishedDate" => Ok(SortField::PublishedDate),
            "lastModifiedDate" => Ok(SortField::LastModifiedDate),
            other => Err(Error::InvalidSortField { field: other.to_string() }),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Resolve the `order` query parameter.
    ///
    /// Absent means descending; anything other than `desc` falls back to
    /// ascending rather than erroring (kept from the original API behavior).
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            None | Some("desc") => SortOrder::Desc,
            Some(_) => SortOrder::Asc,
        }
    }
}

/// One filter clause; clauses in a predicate are ANDed together
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    /// Closed range on base_score; either bound may be open. A record with no
    /// score never matches a bounded range.
    ScoreRange { min: Option<f64>, max: Option<f64> },

    /// published_date in [start, end), half-open
    PublishedIn { start: DateTime<Utc>, end: DateTime<Utc> },

    /// last_modified_date >= cutoff
    ModifiedSince { cutoff: DateTime<Utc> },

    /// Case-insensitive substring over description
    Keyword { needle: String },
}

/// A composable filter over stored CVE records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Predicate {
    clauses: Vec<Clause>,
}

impl Predicate {
    /// A predicate matching every record
    pub fn match_all() -> Self {
        Self::default()
    }

    /// Build a predicate from request parameters.
    ///
    /// `min_score` and `max_score` merge into a single range clause with
    /// independent bounds, so setting one never clobbers the other.
    /// `modified_since_days` is resolved against the current UTC wall clock.
    pub fn build(req: &QueryRequest) -> Result<Self> {
        let mut clauses = Vec::new();

        if req.min_score.is_some() || req.max_score.is_some() {
            for (name, bound) in [("min_score", req.min_score), ("max_score", req.max_score)] {
                if let Some(score) = bound {
                    if !(0.0..=10.0).contains(&score) {
                        return Err(Error::InvalidInput(format!(
                            "{name} must be within [0.0, 10.0], got {score}"
                        )));
                    }
                }
            }
            clauses.push(Clause::ScoreRange {
                min: req.min_score,
                max: req.max_score,
            });
        }

        if let Some(year) = req.year {
            let start = year_start(year)?;
            let end = year_start(year + 1)?;
            clauses.push(Clause::PublishedIn { start, end });
        }

        if let Some(days) = req.modified_since_days {
            if days < 0 {
                return Err(Error::InvalidInput(format!(
                    "days must be non-negative, got {days}"
                )));
            }
            clauses.push(Clause::ModifiedSince {
                cutoff: Utc::now() - Duration::days(days),
            });
        }

        if let Some(ref keyword) = req.keyword {
            let needle = keyword.trim();
            if needle.is_empty() {
                return Err(Error::InvalidInput(String::from(
                    "keyword must not be empty",
                )));
            }
            clauses.push(Clause::Keyword { needle: needle.to_lowercase() });
        }

        Ok(Self { clauses })
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    pub fn is_match_all(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Evaluate the predicate against a record in memory.
    ///
    /// The SQLite store compiles clauses to SQL instead; this is the reference
    /// semantics and what in-memory callers use.
    pub fn matches(&self, record: &CveRecord) -> bool {
        self.clauses.iter().all(|clause| match clause {
            Clause::ScoreRange { min, max } => match record.base_score {
                None => false,
                Some(score) => {
                    min.map_or(true, |m| score >= m) && max.map_or(true, |m| score <= m)
                }
            },
            Clause::PublishedIn { start, end } => {
                record.published_date >= *start && record.published_date < *end
            }
            Clause::ModifiedSince { cutoff } => record.last_modified_date >= *cutoff,
            Clause::Keyword { needle } => record.description.to_lowercase().contains(needle),
        })
    }
}

fn year_start(year: i32) -> Result<DateTime<Utc>> {
    Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .single()
        .ok_or_else(|| Error::InvalidInput(format!("invalid year: {year}")))
}

/// Paged search response
#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub page: u64,
    pub limit: u64,
    pub total_results: u64,
    pub total_pages: u64,
    pub data: Vec<CveRecord>,
}
