//! Informational endpoint integration tests
//!
//! Banner, model and endpoint catalogs, the echo endpoint, the metrics
//! exposition and the catch-all for unknown routes.

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

use crate::common::{assert_error_envelope, unconfigured, TestApp};

#[tokio::test]
async fn test_index_banner() {
    let app = TestApp::new();

    let response = app.server.get("/").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Cloudbridge API is running");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_timestamp_is_rfc3339_utc() {
    let app = TestApp::new();

    let body: Value = app.server.get("/").await.json();
    let stamp = body["timestamp"].as_str().unwrap();

    let pattern = regex::Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}\.\d{3}Z$").unwrap();
    assert!(pattern.is_match(stamp), "unexpected timestamp {}", stamp);
}

#[tokio::test]
async fn test_models_catalog_is_static() {
    // Catalog does not depend on configuration
    let app = TestApp::with_config(unconfigured());

    let body: Value = app.server.get("/api/models").await.json();

    let ids: Vec<&str> = body["models"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["id"].as_str().unwrap())
        .collect();
    assert_eq!(
        ids,
        vec!["command", "command-light", "command-nightly", "command-light-nightly"]
    );
    assert_eq!(body["endpoint"], "/api/cohere/inference");
    assert!(body["models"][0]["name"].is_string());
    assert!(body["models"][0]["description"].is_string());
}

#[tokio::test]
async fn test_docs_lists_every_endpoint() {
    let app = TestApp::new();

    let body: Value = app.server.get("/api/docs").await.json();
    let endpoints = body["endpoints"].as_object().unwrap();

    for key in [
        "GET /api/health",
        "POST /api/cohere/inference",
        "POST /api/gcs/upload",
        "GET /api/gcs/download/:fileName",
        "DELETE /api/gcs/files/:fileName",
        "GET /api/gcs/files/:fileName/metadata",
    ] {
        assert!(endpoints.contains_key(key), "missing {}", key);
    }
    assert!(body["examples"]["inference"]["body"]["prompt"].is_string());
}

#[tokio::test]
async fn test_echo_returns_body() {
    let app = TestApp::new();
    let payload = json!({"name": "widget", "tags": ["a", "b"], "count": 3});

    let response = app.server.post("/api/data").json(&payload).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Data received successfully");
    assert_eq!(body["receivedData"], payload);
}

#[tokio::test]
async fn test_echo_empty_body_reads_as_empty_object() {
    let app = TestApp::new();

    let body: Value = app.server.post("/api/data").await.json();

    assert_eq!(body["receivedData"], json!({}));
}

#[tokio::test]
async fn test_echo_malformed_json_is_unhandled_error() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/data")
        .content_type("application/json")
        .bytes("{\"name\": ".into())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "Internal server error");
}

#[tokio::test]
async fn test_unknown_path_lists_endpoints() {
    let app = TestApp::new();

    let response = app.server.get("/api/nonexistent").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "Not Found");
    assert_eq!(body["message"], "Route GET /api/nonexistent not found");

    let endpoints: Vec<&str> = body["available_endpoints"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e.as_str().unwrap())
        .collect();
    for route in [
        "GET /",
        "GET /api/health",
        "GET /api/models",
        "GET /api/docs",
        "POST /api/data",
        "POST /api/cohere/inference",
        "POST /api/gcs/upload",
        "GET /api/gcs/download/:fileName",
        "GET /api/gcs/files",
        "DELETE /api/gcs/files/:fileName",
        "GET /api/gcs/files/:fileName/metadata",
    ] {
        assert!(endpoints.contains(&route), "missing {}", route);
    }
}

#[tokio::test]
async fn test_unknown_method_on_known_path_is_not_found() {
    let app = TestApp::new();

    let response = app.server.method(Method::PATCH, "/api/health").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(body["message"], "Route PATCH /api/health not found");
    assert!(body["available_endpoints"].is_array());
}

#[tokio::test]
async fn test_get_on_post_only_route_is_not_found() {
    let app = TestApp::new();

    let response = app.server.get("/api/cohere/inference").await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn test_cors_allows_any_origin() {
    let app = TestApp::new();

    let response = app
        .server
        .get("/api/health")
        .add_header(
            axum::http::header::ORIGIN,
            axum::http::HeaderValue::from_static("https://app.example.com"),
        )
        .await;

    response.assert_status_ok();
    assert_eq!(
        response.header("access-control-allow-origin"),
        axum::http::HeaderValue::from_static("*")
    );
}

#[tokio::test]
async fn test_metrics_expose_upstream_calls() {
    cloudbridge::routes::metrics::init_metrics();
    let app = TestApp::new();

    app.server
        .post("/api/cohere/inference")
        .json(&json!({"prompt": "count me"}))
        .await
        .assert_status_ok();

    let response = app.server.get("/metrics").await;

    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("cloudbridge_upstream_requests_total"), "{}", text);
    assert!(text.contains("service=\"fake\""), "{}", text);
}
