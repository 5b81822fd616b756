//! File storage endpoint integration tests
//!
//! Upload, download links, listing, deletion and metadata over the
//! in-memory object store.

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{json, Value};

use crate::common::{assert_error_envelope, offline_config, TestApp};
use cloudbridge::config::Config;

const TEN_MIB: usize = 10 * 1024 * 1024;

fn file_form(name: &str, mime: &str, len: usize) -> MultipartForm {
    let part = Part::bytes(vec![b'x'; len]).file_name(name).mime_type(mime);
    MultipartForm::new().add_part("file", part)
}

fn no_bucket() -> Config {
    Config {
        gcs_bucket_name: None,
        ..offline_config()
    }
}

/// Seconds between an RFC 3339 stamp and now
fn seconds_from_now(stamp: &str) -> i64 {
    let at: DateTime<Utc> = DateTime::parse_from_rfc3339(stamp)
        .expect("expiresAt is not RFC 3339")
        .with_timezone(&Utc);
    (at - Utc::now()).num_seconds()
}

// =============================================================================
// POST /api/gcs/upload
// =============================================================================

#[tokio::test]
async fn test_upload_stores_file_under_generated_name() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/gcs/upload")
        .multipart(file_form("report.pdf", "application/pdf", 500_000))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "File uploaded successfully");
    assert_eq!(body["originalName"], "report.pdf");
    assert_eq!(body["size"], 500_000);
    assert_eq!(body["mimeType"], "application/pdf");

    let file_name = body["fileName"].as_str().unwrap();
    let pattern = Regex::new(r"^\d+-[A-Za-z0-9]+\.pdf$").unwrap();
    assert!(pattern.is_match(file_name), "unexpected name {}", file_name);
    assert_ne!(file_name, "report.pdf");

    assert!(body["signedUrl"].as_str().unwrap().contains(file_name));
    let ttl = seconds_from_now(body["expiresAt"].as_str().unwrap());
    assert!((24 * 3600 - 60..=24 * 3600).contains(&ttl), "ttl was {}", ttl);

    assert_eq!(app.store.stored_size(file_name), Some(500_000));
}

#[tokio::test]
async fn test_uploads_of_same_name_do_not_collide() {
    let app = TestApp::new();

    let first: Value = app
        .server
        .post("/api/gcs/upload")
        .multipart(file_form("notes.txt", "text/plain", 16))
        .await
        .json();
    let second: Value = app
        .server
        .post("/api/gcs/upload")
        .multipart(file_form("notes.txt", "text/plain", 16))
        .await
        .json();

    assert_ne!(first["fileName"], second["fileName"]);
    assert_eq!(app.store.len(), 2);
}

#[tokio::test]
async fn test_upload_records_original_name_in_metadata() {
    let app = TestApp::new();

    let uploaded: Value = app
        .server
        .post("/api/gcs/upload")
        .multipart(file_form("photo.PNG", "image/png", 1024))
        .await
        .json();
    let file_name = uploaded["fileName"].as_str().unwrap();
    assert!(file_name.ends_with(".PNG"));

    let body: Value = app
        .server
        .get(&format!("/api/gcs/files/{}/metadata", file_name))
        .await
        .json();

    assert_eq!(body["metadata"]["fileName"], file_name);
    assert_eq!(body["metadata"]["originalName"], "photo.PNG");
    assert_eq!(body["metadata"]["contentType"], "image/png");
    assert!(body["metadata"]["metadata"]["uploadedAt"].is_string());
}

#[tokio::test]
async fn test_upload_without_file_is_rejected() {
    let app = TestApp::new();

    let form = MultipartForm::new().add_text("description", "no file here");
    let response = app.server.post("/api/gcs/upload").multipart(form).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "No file uploaded");
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_upload_with_json_body_is_missing_file() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/gcs/upload")
        .json(&json!({"file": "report.pdf"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_disallowed_extension_is_rejected_before_store() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/gcs/upload")
        .multipart(file_form("setup.exe", "application/octet-stream", 2048))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "Invalid file type");
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_allowed_extension_with_disallowed_mime_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/gcs/upload")
        .multipart(file_form("notes.txt", "application/x-msdownload", 64))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_oversize_file_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/gcs/upload")
        .multipart(file_form("big.pdf", "application/pdf", TEN_MIB + 1))
        .await;

    response.assert_status(StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "File too large");
    assert_eq!(app.store.calls(), 0);
}

#[tokio::test]
async fn test_file_at_size_limit_is_accepted() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/gcs/upload")
        .multipart(file_form("exact.pdf", "application/pdf", TEN_MIB))
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_upload_without_bucket_is_server_error() {
    let app = TestApp::with_config(no_bucket());

    let response = app
        .server
        .post("/api/gcs/upload")
        .multipart(file_form("report.pdf", "application/pdf", 100))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "Service not configured");
    assert_eq!(app.store.calls(), 0);
}

// =============================================================================
// GET /api/gcs/download/:fileName
// =============================================================================

#[tokio::test]
async fn test_download_link_for_existing_file() {
    let app = TestApp::new();
    app.store.seed("1700000000000-abcdEFGH12.pdf", "report.pdf", 10, "application/pdf");

    let response = app
        .server
        .get("/api/gcs/download/1700000000000-abcdEFGH12.pdf")
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["fileName"], "1700000000000-abcdEFGH12.pdf");
    assert!(body["downloadUrl"].as_str().unwrap().contains("X-Goog-Expires=3600"));
    let ttl = seconds_from_now(body["expiresAt"].as_str().unwrap());
    assert!((3600 - 60..=3600).contains(&ttl), "ttl was {}", ttl);
}

#[tokio::test]
async fn test_download_link_for_unknown_file_is_not_found() {
    let app = TestApp::new();

    let response = app.server.get("/api/gcs/download/nope.pdf").await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "File not found");
    assert!(body.get("available_endpoints").is_none());
}

// =============================================================================
// GET /api/gcs/files
// =============================================================================

#[tokio::test]
async fn test_list_empty_bucket() {
    let app = TestApp::new();

    let response = app.server.get("/api/gcs/files").await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["files"], json!([]));
    assert_eq!(body["count"], 0);
}

#[tokio::test]
async fn test_list_describes_every_file() {
    let app = TestApp::new();
    app.store.seed("1-aaaaaaaaaa.pdf", "a.pdf", 100, "application/pdf");
    app.store.seed("2-bbbbbbbbbb.csv", "b.csv", 200, "text/csv");

    let body: Value = app.server.get("/api/gcs/files").await.json();

    assert_eq!(body["count"], 2);
    let files = body["files"].as_array().unwrap();
    assert_eq!(files[0]["fileName"], "1-aaaaaaaaaa.pdf");
    assert_eq!(files[0]["originalName"], "a.pdf");
    assert_eq!(files[0]["size"], 100);
    assert_eq!(files[1]["contentType"], "text/csv");
    assert!(files[1]["createdAt"].is_string());
}

#[tokio::test]
async fn test_list_without_bucket_is_server_error() {
    let app = TestApp::with_config(no_bucket());

    let response = app.server.get("/api/gcs/files").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.store.calls(), 0);
}

// =============================================================================
// DELETE /api/gcs/files/:fileName and GET .../metadata
// =============================================================================

#[tokio::test]
async fn test_delete_then_delete_again() {
    let app = TestApp::new();
    app.store.seed("1-cccccccccc.pdf", "c.pdf", 10, "application/pdf");

    let response = app.server.delete("/api/gcs/files/1-cccccccccc.pdf").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["message"], "File deleted successfully");
    assert_eq!(body["fileName"], "1-cccccccccc.pdf");
    assert_eq!(app.store.len(), 0);

    let metadata = app.server.get("/api/gcs/files/1-cccccccccc.pdf/metadata").await;
    metadata.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = metadata.json();
    assert_eq!(body["error"], "Failed to get file metadata");

    let again = app.server.delete("/api/gcs/files/1-cccccccccc.pdf").await;
    again.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_metadata_of_missing_file_is_server_error() {
    let app = TestApp::new();

    let response = app.server.get("/api/gcs/files/gone.pdf/metadata").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "Failed to get file metadata");
    assert!(body["message"].as_str().unwrap().contains("No such object"));
}

#[tokio::test]
async fn test_delete_without_bucket_is_server_error() {
    let app = TestApp::with_config(no_bucket());

    let response = app.server.delete("/api/gcs/files/x.pdf").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.store.calls(), 0);
}
