//! Health check endpoint
//!
//! Reports uptime and whether each upstream service is configured. Nothing
//! is contacted: "configured" only means the relevant setting is present.

use std::sync::Arc;

use axum::extract::State;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    envelope::{success, Envelope},
    AppState,
};

/// Configuration status of one upstream service
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, ToSchema)]
pub enum ServiceStatus {
    #[serde(rename = "configured")]
    Configured,
    #[serde(rename = "not configured")]
    NotConfigured,
}

impl From<bool> for ServiceStatus {
    fn from(configured: bool) -> Self {
        if configured {
            ServiceStatus::Configured
        } else {
            ServiceStatus::NotConfigured
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ServicesStatus {
    pub generation: ServiceStatus,
    pub storage: ServiceStatus,
}

/// Health check payload
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthPayload {
    pub status: String,
    /// Seconds since startup
    pub uptime: f64,
    pub services: ServicesStatus,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/api/health",
    tag = "Info",
    responses((status = 200, description = "Service health", body = HealthPayload))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Envelope<HealthPayload> {
    success(HealthPayload {
        status: "OK".to_string(),
        uptime: state.start_time.elapsed().as_secs_f64(),
        services: ServicesStatus {
            generation: state.config.generation_configured().into(),
            storage: state.config.storage_configured().into(),
        },
    })
}
