//! Canonical CVE record model and normalization of raw feed payloads

use crate::error::{Error, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder used when the upstream feed provides no description
pub const NO_DESCRIPTION: &str = "No description available";

/// Canonical CVE record as stored and served
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CveRecord {
    /// Unique identifier, e.g. "CVE-2023-1234". Immutable after creation.
    pub id: String,

    /// Free-text description; placeholder when the source has none
    pub description: String,

    /// CVSS base score in [0.0, 10.0]; absent when no metric is available
    pub base_score: Option<f64>,

    /// When the vulnerability was disclosed
    pub published_date: DateTime<Utc>,

    /// Last upstream modification; usually >= published_date, but inconsistent
    /// upstream data is accepted as-is
    pub last_modified_date: DateTime<Utc>,
}

impl CveRecord {
    /// Validate a record for manual submission.
    ///
    /// Ingestion-side validation happens in [`normalize`]; this covers the
    /// fields a caller controls directly on the add path.
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(Error::MissingField { field: String::from("id") });
        }
        if let Some(score) = self.base_score {
            if !(0.0..=10.0).contains(&score) {
                return Err(Error::InvalidInput(format!(
                    "baseScore must be within [0.0, 10.0], got {score}"
                )));
            }
        }
        Ok(())
    }
}

/// Parse an upstream timestamp.
///
/// NVD API 2.0 emits naive timestamps like `2021-12-10T10:15:09.143` (implied
/// UTC); manual submissions may carry an RFC 3339 offset.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|_| Error::InvalidInput(format!("unparseable timestamp: {value}")))
}

/// Normalize one raw feed item into the canonical record shape.
///
/// Fails with `MissingField`/`InvalidInput` when `id` is absent or the dates
/// do not parse; the ingestion pipeline counts these as skips.
pub fn normalize(raw: &RawVulnerability) -> Result<CveRecord> {
    let cve = &raw.cve;

    let id = cve
        .id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| Error::MissingField { field: String::from("id") })?
        .to_string();

    let published = cve
        .published
        .as_deref()
        .ok_or_else(|| Error::MissingField { field: String::from("published") })
        .and_then(parse_timestamp)?;

    let last_modified = cve
        .last_modified
        .as_deref()
        .ok_or_else(|| Error::MissingField { field: String::from("lastModified") })
        .and_then(parse_timestamp)?;

    // Prefer the English description, fall back to whatever is first
    let description = cve
        .descriptions
        .iter()
        .find(|d| d.lang == "en")
        .or_else(|| cve.descriptions.first())
        .map(|d| d.value.clone())
        .unwrap_or_else(|| String::from(NO_DESCRIPTION));

    let base_score = cve.metrics.as_ref().and_then(RawMetrics::first_base_score);

    Ok(CveRecord {
        id,
        description,
        base_score,
        published_date: published,
        last_modified_date: last_modified,
    })
}

/// Record fields as submitted to the add endpoint, before validation
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSubmission {
    pub id: Option<String>,
    pub description: Option<String>,
    pub base_score: Option<f64>,
    pub published_date: Option<String>,
    pub last_modified_date: Option<String>,
}

impl RawSubmission {
    /// Validate and convert into a canonical record.
    ///
    /// Reports every missing or malformed field in one error so a caller can
    /// fix the whole payload at once.
    pub fn into_record(self) -> Result<CveRecord> {
        let mut bad_fields = Vec::new();

        let id = match self.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Some(id.to_string()),
            _ => {
                bad_fields.push("id");
                None
            }
        };

        let published = match self.published_date.as_deref() {
            Some(raw) => match parse_timestamp(raw) {
                Ok(dt) => Some(dt),
                Err(_) => {
                    bad_fields.push("publishedDate");
                    None
                }
            },
            None => {
                bad_fields.push("publishedDate");
                None
            }
        };

        let last_modified = match self.last_modified_date.as_deref() {
            Some(raw) => match parse_timestamp(raw) {
                Ok(dt) => Some(dt),
                Err(_) => {
                    bad_fields.push("lastModifiedDate");
                    None
                }
            },
            None => {
                bad_fields.push("lastModifiedDate");
                None
            }
        };

        if let Some(score) = self.base_score {
            if !(0.0..=10.0).contains(&score) {
                bad_fields.push("baseScore");
            }
        }

        if !bad_fields.is_empty() {
            return Err(Error::InvalidInput(format!(
                "missing or malformed fields: {}",
                bad_fields.join(", ")
            )));
        }

        Ok(CveRecord {
            id: id.unwrap_or_default(),
            description: self
                .description
                .unwrap_or_else(|| String::from(NO_DESCRIPTION)),
            base_score: self.base_score,
            published_date: published.unwrap_or_default(),
            last_modified_date: last_modified.unwrap_or_default(),
        })
    }
}

// Raw NVD API 2.0 response shapes

#[derive(Debug, Clone, Deserialize)]
pub struct RawVulnerability {
    pub cve: RawCve,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCve {
    pub id: Option<String>,
    pub published: Option<String>,
    pub last_modified: Option<String>,
    #[serde(default)]
    pub descriptions: Vec<RawDescription>,
    pub metrics: Option<RawMetrics>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDescription {
    pub lang: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetrics {
    pub cvss_metric_v31: Option<Vec<RawCvssMetric>>,
    pub cvss_metric_v30: Option<Vec<RawCvssMetric>>,
    pub cvss_metric_v2: Option<Vec<RawCvssMetric>>,
}

impl RawMetrics {
    /// First entry of the first available metric list, newest CVSS version first
    fn first_base_score(&self) -> Option<f64> {
        [&self.cvss_metric_v31, &self.cvss_metric_v30, &self.cvss_metric_v2]
            .into_iter()
            .find_map(|list| list.as_ref().and_then(|v| v.first()))
            .map(|m| m.cvss_data.base_score)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCvssMetric {
    pub cvss_data: RawCvssData,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCvssData {
    pub base_score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawVulnerability {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_normalize_full_record() {
        let vuln = raw(json!({
            "cve": {
                "id": "CVE-2021-44228",
                "published": "2021-12-10T10:15:09.143",
                "lastModified": "2023-11-07T04:44:00.000",
                "descriptions": [
                    {"lang": "es", "value": "desbordamiento"},
                    {"lang": "en", "value": "Log4Shell RCE"}
                ],
                "metrics": {
                    "cvssMetricV31": [{"cvssData": {"baseScore": 10.0}}]
                }
            }
        }));

        let record = normalize(&vuln).unwrap();
        assert_eq!(record.id, "CVE-2021-44228");
        assert_eq!(record.description, "Log4Shell RCE");
        assert_eq!(record.base_score, Some(10.0));
        assert_eq!(record.published_date.to_rfc3339(), "2021-12-10T10:15:09.143+00:00");
    }

    #[test]
    fn test_normalize_missing_id() {
        let vuln = raw(json!({
            "cve": {
                "published": "2021-12-10T10:15:09.143",
                "lastModified": "2021-12-10T10:15:09.143",
                "descriptions": []
            }
        }));

        let err = normalize(&vuln).unwrap_err();
        assert!(matches!(err, Error::MissingField { ref field } if field == "id"));
    }

    #[test]
    fn test_normalize_unparseable_date() {
        let vuln = raw(json!({
            "cve": {
                "id": "CVE-2020-0001",
                "published": "last tuesday",
                "lastModified": "2021-12-10T10:15:09.143",
                "descriptions": []
            }
        }));

        assert!(matches!(normalize(&vuln), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_normalize_placeholder_description_and_absent_score() {
        let vuln = raw(json!({
            "cve": {
                "id": "CVE-2020-0002",
                "published": "2020-01-01T00:00:00.000",
                "lastModified": "2020-01-02T00:00:00.000",
                "descriptions": []
            }
        }));

        let record = normalize(&vuln).unwrap();
        assert_eq!(record.description, NO_DESCRIPTION);
        assert_eq!(record.base_score, None);
    }

    #[test]
    fn test_metric_version_preference() {
        let vuln = raw(json!({
            "cve": {
                "id": "CVE-2020-0003",
                "published": "2020-01-01T00:00:00.000",
                "lastModified": "2020-01-02T00:00:00.000",
                "descriptions": [],
                "metrics": {
                    "cvssMetricV2": [{"cvssData": {"baseScore": 5.0}}],
                    "cvssMetricV31": [{"cvssData": {"baseScore": 9.8}}]
                }
            }
        }));

        assert_eq!(normalize(&vuln).unwrap().base_score, Some(9.8));
    }

    #[test]
    fn test_v2_only_metrics() {
        let vuln = raw(json!({
            "cve": {
                "id": "CVE-2004-0001",
                "published": "2004-01-01T00:00:00.000",
                "lastModified": "2004-01-02T00:00:00.000",
                "descriptions": [],
                "metrics": {
                    "cvssMetricV2": [
                        {"cvssData": {"baseScore": 7.5}},
                        {"cvssData": {"baseScore": 2.1}}
                    ]
                }
            }
        }));

        // First entry of the only available list
        assert_eq!(normalize(&vuln).unwrap().base_score, Some(7.5));
    }

    #[test]
    fn test_submission_reports_all_bad_fields() {
        let submission = RawSubmission {
            id: None,
            description: Some(String::from("heap overflow")),
            base_score: Some(42.0),
            published_date: Some(String::from("not a date")),
            last_modified_date: None,
        };

        let err = submission.into_record().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("id"));
        assert!(msg.contains("publishedDate"));
        assert!(msg.contains("lastModifiedDate"));
        assert!(msg.contains("baseScore"));
    }

    #[test]
    fn test_submission_valid() {
        let submission = RawSubmission {
            id: Some(String::from("CVE-2023-1234")),
            description: None,
            base_score: Some(6.1),
            published_date: Some(String::from("2023-03-01T12:00:00.000")),
            last_modified_date: Some(String::from("2023-03-05T12:00:00Z")),
        };

        let record = submission.into_record().unwrap();
        assert_eq!(record.id, "CVE-2023-1234");
        assert_eq!(record.description, NO_DESCRIPTION);
        assert_eq!(record.base_score, Some(6.1));
    }

    #[test]
    fn test_record_serializes_with_source_field_names() {
        let record = CveRecord {
            id: String::from("CVE-2023-1234"),
            description: String::from("test"),
            base_score: None,
            published_date: Utc::now(),
            last_modified_date: Utc::now(),
        };

        let value = serde_json::to_value(&record).unwrap();
        assert!(value.get("baseScore").is_some());
        assert!(value.get("publishedDate").is_some());
        assert!(value.get("lastModifiedDate").is_some());
    }
}
