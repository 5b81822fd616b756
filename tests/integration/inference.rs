//! Text generation endpoint integration tests
//!
//! POST /api/cohere/inference validates the prompt, then the credential,
//! then forwards to the generator with defaults applied.

use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::common::{assert_error_envelope, offline_config, FakeGenerator, TestApp};
use cloudbridge::config::Config;

#[tokio::test]
async fn test_generation_success() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/cohere/inference")
        .json(&json!({"prompt": "Say hello", "model": "command-light", "max_tokens": 20, "temperature": 0.2}))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["response"], "Hello from the fake");
    assert_eq!(body["model"], "command-light");
    assert_eq!(body["usage"]["promptTokens"], 5);
    assert_eq!(body["usage"]["completionTokens"], 7);
    assert_eq!(body["usage"]["totalTokens"], 12);

    let sent = app.generator.last_request().unwrap();
    assert_eq!(sent.prompt, "Say hello");
    assert_eq!(sent.max_tokens, 20);
    assert!((sent.temperature - 0.2).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_generation_applies_defaults() {
    let app = TestApp::new();

    let body: Value = app
        .server
        .post("/api/cohere/inference")
        .json(&json!({"prompt": "Defaults please"}))
        .await
        .json();

    assert_eq!(body["model"], "command");
    let sent = app.generator.last_request().unwrap();
    assert_eq!(sent.model, "command");
    assert_eq!(sent.max_tokens, 150);
    assert!((sent.temperature - 0.7).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_missing_prompt_is_rejected_before_generation() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/cohere/inference")
        .json(&json!({"model": "command"}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "Missing required field");
    assert_eq!(body["message"], "prompt is required");
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn test_empty_prompt_is_rejected() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/cohere/inference")
        .json(&json!({"prompt": ""}))
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn test_empty_body_counts_as_missing_prompt() {
    let app = TestApp::new();

    let response = app.server.post("/api/cohere/inference").await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_credential_is_server_error() {
    let config = Config {
        cohere_api_key: None,
        ..offline_config()
    };
    let app = TestApp::with_config(config);

    let response = app
        .server
        .post("/api/cohere/inference")
        .json(&json!({"prompt": "Hello"}))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "Service not configured");
    assert_eq!(body["message"], "Cohere API key not configured");
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn test_prompt_checked_before_credential() {
    let config = Config {
        cohere_api_key: None,
        ..offline_config()
    };
    let app = TestApp::with_config(config);

    let response = app.server.post("/api/cohere/inference").json(&json!({})).await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_provider_rejection_surfaces_as_server_error() {
    let app = TestApp::with(offline_config(), FakeGenerator::failing(401, "invalid api token"));

    let response = app
        .server
        .post("/api/cohere/inference")
        .json(&json!({"prompt": "Hello"}))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(assert_error_envelope(&body), "Failed to generate text");
    assert!(body["message"].as_str().unwrap().contains("invalid api token"));
    assert_eq!(app.generator.calls(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_unhandled_error() {
    let app = TestApp::new();

    let response = app
        .server
        .post("/api/cohere/inference")
        .content_type("application/json")
        .bytes("{prompt".into())
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.generator.calls(), 0);
}
