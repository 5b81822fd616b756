//! Prometheus metrics endpoint
//!
//! Exposes upstream call metrics in Prometheus format for monitoring.

use std::time::Instant;

use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    // Force initialization of the lazy static
    let _ = &*PROMETHEUS_HANDLE;

    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "cloudbridge_upstream_requests_total",
        "Total number of upstream calls by service, operation and outcome"
    );
    metrics::describe_histogram!(
        "cloudbridge_upstream_duration_seconds",
        "Upstream call duration in seconds"
    );
    metrics::describe_counter!(
        "cloudbridge_uploaded_bytes_total",
        "Total bytes forwarded to object storage"
    );
}

/// Prometheus metrics endpoint handler
pub async fn prometheus_metrics() -> impl IntoResponse {
    PROMETHEUS_HANDLE.render()
}

/// Record the outcome and latency of one upstream call
pub fn record_upstream_call<T, E>(
    service: &'static str,
    operation: &'static str,
    result: &Result<T, E>,
    started: Instant,
) {
    let outcome = if result.is_ok() { "success" } else { "error" };

    metrics::counter!(
        "cloudbridge_upstream_requests_total",
        "service" => service,
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!(
        "cloudbridge_upstream_duration_seconds",
        "service" => service,
        "operation" => operation
    )
    .record(started.elapsed().as_secs_f64());
}

/// Record bytes forwarded in an upload
pub fn record_uploaded_bytes(count: u64) {
    metrics::counter!("cloudbridge_uploaded_bytes_total").increment(count);
}
