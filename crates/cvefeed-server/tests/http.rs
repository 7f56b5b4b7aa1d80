//! HTTP transport integration tests.
//!
//! Starts an axum server over an in-memory store and exercises it with
//! reqwest.

use std::sync::Arc;

use chrono::{Duration, Utc};
use cvefeed_core::{CveRecord, CveStore};
use cvefeed_query::QueryService;
use cvefeed_store::CveDb;
use serde_json::json;

fn record(id: &str, score: Option<f64>, published: &str, desc: &str) -> CveRecord {
    CveRecord {
        id: id.to_string(),
        description: desc.to_string(),
        base_score: score,
        published_date: published.parse().unwrap(),
        last_modified_date: published.parse().unwrap(),
    }
}

fn seeded_store() -> Arc<CveDb> {
    let store = Arc::new(CveDb::in_memory().unwrap());
    let records = vec![
        record("CVE-2022-1111", Some(9.8), "2022-05-01T00:00:00Z", "Heap overflow in parser"),
        record("CVE-2023-2222", Some(5.0), "2023-12-31T23:59:59Z", "Stack overflow in decoder"),
        record("CVE-2024-3333", None, "2024-01-01T00:00:00Z", "Information disclosure"),
    ];
    for r in &records {
        store.insert_if_absent(r).unwrap();
    }

    // One record modified just now, for the /cves/modified default window
    let mut fresh = record("CVE-2024-4444", Some(7.0), "2024-02-01T00:00:00Z", "Race condition");
    fresh.last_modified_date = Utc::now() - Duration::hours(1);
    store.insert_if_absent(&fresh).unwrap();

    store
}

/// Bind to port 0 and return the actual address.
async fn start_server(store: Arc<CveDb>) -> String {
    let service = Arc::new(QueryService::new(store));
    let app = cvefeed_server::router(service);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn home_route() {
    let base = start_server(seeded_store()).await;
    let resp = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "CVE API is running!");
}

#[tokio::test]
async fn get_cve_by_id() {
    let base = start_server(seeded_store()).await;

    let resp = reqwest::get(format!("{base}/cve/CVE-2022-1111")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["id"], "CVE-2022-1111");
    assert_eq!(body["baseScore"], 9.8);
    assert_eq!(body["description"], "Heap overflow in parser");

    let resp = reqwest::get(format!("{base}/cve/CVE-9999-0000")).await.unwrap();
    assert_eq!(resp.status(), 404);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn list_cves_with_score_bounds() {
    let base = start_server(seeded_store()).await;

    // Both bounds apply; unscored records never match a bounded range
    let resp = reqwest::get(format!("{base}/cves?min_score=4.0&max_score=8.0"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: Vec<serde_json::Value> = resp.json().await.unwrap();
    let mut ids: Vec<_> = body.iter().map(|r| r["id"].as_str().unwrap()).collect();
    ids.sort();
    assert_eq!(ids, vec!["CVE-2023-2222", "CVE-2024-4444"]);

    // No bounds returns everything, including unscored
    let resp = reqwest::get(format!("{base}/cves")).await.unwrap();
    let body: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(body.len(), 4);
}

#[tokio::test]
async fn cves_by_year_boundary() {
    let base = start_server(seeded_store()).await;

    let resp = reqwest::get(format!("{base}/cves/year/2023")).await.unwrap();
    let body: Vec<serde_json::Value> = resp.json().await.unwrap();
    // 2023-12-31T23:59:59 is in; 2024-01-01T00:00:00 is not
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["id"], "CVE-2023-2222");
}

#[tokio::test]
async fn cves_modified_default_window() {
    let base = start_server(seeded_store()).await;

    let resp = reqwest::get(format!("{base}/cves/modified")).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert_eq!(body.len(), 1);
    assert_eq!(body[0]["id"], "CVE-2024-4444");
}

#[tokio::test]
async fn search_requires_keyword() {
    let base = start_server(seeded_store()).await;

    let resp = reqwest::get(format!("{base}/cves/search")).await.unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "MISSING_FIELD");

    let resp = reqwest::get(format!("{base}/cves/search?keyword=%20%20")).await.unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn search_paged_response_shape() {
    let base = start_server(seeded_store()).await;

    let resp = reqwest::get(format!(
        "{base}/cves/search?keyword=overflow&page=1&limit=1&sort=baseScore&order=desc"
    ))
    .await
    .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 1);
    assert_eq!(body["total_results"], 2);
    assert_eq!(body["total_pages"], 2);
    assert_eq!(body["data"][0]["id"], "CVE-2022-1111");
}

#[tokio::test]
async fn search_rejects_unknown_sort_field() {
    let base = start_server(seeded_store()).await;

    let resp = reqwest::get(format!("{base}/cves/search?keyword=overflow&sort=foo"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["code"], "INVALID_SORT_FIELD");
    let msg = body["error"].as_str().unwrap();
    assert!(msg.contains("baseScore"));
    assert!(msg.contains("publishedDate"));
    assert!(msg.contains("lastModifiedDate"));
}

#[tokio::test]
async fn add_cve_lifecycle() {
    let base = start_server(seeded_store()).await;
    let client = reqwest::Client::new();

    let payload = json!({
        "id": "CVE-2024-5555",
        "description": "Out-of-bounds write",
        "baseScore": 8.1,
        "publishedDate": "2024-03-01T00:00:00Z",
        "lastModifiedDate": "2024-03-02T00:00:00Z"
    });

    let resp = client
        .post(format!("{base}/cves/add"))
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "CVE added");
    assert_eq!(body["data"]["id"], "CVE-2024-5555");

    // Same id again conflicts and leaves the stored record alone
    let resp = client
        .post(format!("{base}/cves/add"))
        .json(&json!({
            "id": "CVE-2024-5555",
            "description": "changed",
            "publishedDate": "2024-03-01T00:00:00Z",
            "lastModifiedDate": "2024-03-02T00:00:00Z"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let stored: serde_json::Value = reqwest::get(format!("{base}/cve/CVE-2024-5555"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["description"], "Out-of-bounds write");
}

#[tokio::test]
async fn add_cve_reports_bad_fields() {
    let base = start_server(seeded_store()).await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{base}/cves/add"))
        .json(&json!({ "description": "no id, no dates", "baseScore": 99.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: serde_json::Value = resp.json().await.unwrap();
    let msg = body["error"].as_str().unwrap();
    assert!(msg.contains("id"));
    assert!(msg.contains("publishedDate"));
    assert!(msg.contains("baseScore"));
}
