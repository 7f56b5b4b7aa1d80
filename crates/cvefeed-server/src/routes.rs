//! HTTP transport binding - maps routes onto the query service
//!
//! ## Routes
//!
//! - `GET  /` — liveness message
//! - `GET  /cves?min_score=&max_score=` — filtered list
//! - `GET  /cve/:id` — single record, 404 when absent
//! - `GET  /cves/year/:year` — records published in a calendar year
//! - `GET  /cves/modified?days=` — records modified in the last N days (default 7)
//! - `GET  /cves/search?keyword=&page=&limit=&sort=&order=` — paged search
//! - `POST /cves/add` — manual record submission, 201/400/409

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cvefeed_core::{
    CveRecord, Error, Predicate, QueryRequest, RawSubmission, DEFAULT_MODIFIED_DAYS,
};
use cvefeed_query::{QueryService, SearchOptions};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::error;

/// Build the axum router over the given service
pub fn router(service: Arc<QueryService>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/cves", get(list_cves))
        .route("/cve/:id", get(get_cve))
        .route("/cves/year/:year", get(cves_by_year))
        .route("/cves/modified", get(cves_modified))
        .route("/cves/search", get(search_cves))
        .route("/cves/add", post(add_cve))
        .with_state(service)
}

/// Error wrapper translating the service taxonomy into HTTP responses
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            Error::InvalidInput(_)
            | Error::MissingField { .. }
            | Error::InvalidSortField { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            ref err => {
                // Transient store/feed failures surface as 500, retryable
                error!(code = err.code(), "Request failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let body = json!({ "error": self.0.to_string(), "code": self.0.code() });
        (status, Json(body)).into_response()
    }
}

async fn home() -> Json<serde_json::Value> {
    Json(json!({ "message": "CVE API is running!" }))
}

#[derive(Debug, Deserialize)]
struct ScoreParams {
    min_score: Option<f64>,
    max_score: Option<f64>,
}

async fn list_cves(
    State(service): State<Arc<QueryService>>,
    Query(params): Query<ScoreParams>,
) -> Result<Json<Vec<CveRecord>>, ApiError> {
    let predicate = Predicate::build(&QueryRequest {
        min_score: params.min_score,
        max_score: params.max_score,
        ..Default::default()
    })?;
    Ok(Json(service.list(&predicate)?))
}

async fn get_cve(
    State(service): State<Arc<QueryService>>,
    Path(id): Path<String>,
) -> Result<Json<CveRecord>, ApiError> {
    Ok(Json(service.get_by_id(&id)?))
}

async fn cves_by_year(
    State(service): State<Arc<QueryService>>,
    Path(year): Path<i32>,
) -> Result<Json<Vec<CveRecord>>, ApiError> {
    let predicate = Predicate::build(&QueryRequest {
        year: Some(year),
        ..Default::default()
    })?;
    Ok(Json(service.list(&predicate)?))
}

#[derive(Debug, Deserialize)]
struct DaysParams {
    days: Option<i64>,
}

async fn cves_modified(
    State(service): State<Arc<QueryService>>,
    Query(params): Query<DaysParams>,
) -> Result<Json<Vec<CveRecord>>, ApiError> {
    let predicate = Predicate::build(&QueryRequest {
        modified_since_days: Some(params.days.unwrap_or(DEFAULT_MODIFIED_DAYS)),
        ..Default::default()
    })?;
    Ok(Json(service.list(&predicate)?))
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    keyword: Option<String>,
    page: Option<i64>,
    limit: Option<i64>,
    sort: Option<String>,
    order: Option<String>,
}

async fn search_cves(
    State(service): State<Arc<QueryService>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<cvefeed_core::SearchResult>, ApiError> {
    let keyword = params
        .keyword
        .ok_or_else(|| Error::MissingField { field: String::from("keyword") })?;

    let predicate = Predicate::build(&QueryRequest {
        keyword: Some(keyword),
        ..Default::default()
    })?;
    let opts = SearchOptions {
        page: params.page,
        limit: params.limit,
        sort: params.sort,
        order: params.order,
    };
    Ok(Json(service.search(&predicate, &opts)?))
}

async fn add_cve(
    State(service): State<Arc<QueryService>>,
    Json(submission): Json<RawSubmission>,
) -> Result<(StatusCode, Json<serde_json::Value>), ApiError> {
    let record = submission.into_record()?;
    let stored = service.add(record)?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "CVE added", "data": stored })),
    ))
}
