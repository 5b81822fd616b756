//! HTTP routes for Cloudbridge
//!
//! This module defines all HTTP endpoints exposed by the proxy.

pub mod catalog;
pub mod extract;
pub mod health;
pub mod inference;
pub mod metrics;
pub mod storage;

use std::any::Any;
use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    response::Response,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::{Any as AnyOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

use crate::{envelope::ErrorEnvelope, validation::MAX_UPLOAD_BYTES, AppState};

/// Room for multipart framing around a maximum-size file
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Create the main application router
pub fn create_router(state: Arc<AppState>) -> Router {
    // A known path with an unknown method gets the same catch-all as an
    // unknown path
    let not_found = catalog::not_found;

    let info_routes = Router::new()
        .route("/", get(catalog::index).fallback(not_found))
        .route("/api/health", get(health::health_check).fallback(not_found))
        .route("/api/models", get(catalog::list_models).fallback(not_found))
        .route("/api/docs", get(catalog::api_docs).fallback(not_found))
        .route("/api/data", post(catalog::echo).fallback(not_found))
        .route("/metrics", get(metrics::prometheus_metrics).fallback(not_found));

    let generation_routes = Router::new().route(
        "/api/cohere/inference",
        post(inference::generate_text).fallback(not_found),
    );

    let storage_routes = Router::new()
        .route(
            "/api/gcs/upload",
            post(storage::upload_file)
                .fallback(not_found)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + MULTIPART_OVERHEAD)),
        )
        .route(
            "/api/gcs/download/:file_name",
            get(storage::download_link).fallback(not_found),
        )
        .route("/api/gcs/files", get(storage::list_files).fallback(not_found))
        .route(
            "/api/gcs/files/:file_name",
            delete(storage::delete_file).fallback(not_found),
        )
        .route(
            "/api/gcs/files/:file_name/metadata",
            get(storage::file_metadata).fallback(not_found),
        );

    let router = Router::new()
        .merge(info_routes)
        .merge(generation_routes)
        .merge(storage_routes)
        .fallback(not_found);

    with_global_layers(router).with_state(state)
}

/// Global middleware (applied to all routes), innermost first
fn with_global_layers<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(AnyOrigin)
        .allow_methods(AnyOrigin)
        .allow_headers(AnyOrigin);

    router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Last-resort handler for panics escaping a request handler
fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };

    error!(message = %message, "Handler panicked");

    ErrorEnvelope::new("Internal server error", message)
        .into_response_with(StatusCode::INTERNAL_SERVER_ERROR)
}
