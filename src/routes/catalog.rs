//! Static informational endpoints
//!
//! Service banner, model catalog, endpoint catalog, the echo endpoint and the
//! catch-all for unknown routes.

use std::collections::BTreeMap;

use axum::{
    extract::OriginalUri,
    http::{Method, StatusCode},
    response::Response,
};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::debug;
use utoipa::ToSchema;

use crate::{
    envelope::{success, Envelope, ErrorEnvelope},
    error::AppResult,
    routes::extract::JsonBody,
};

/// A documented route
#[derive(Debug, Clone, Copy)]
pub struct Endpoint {
    pub method: &'static str,
    pub path: &'static str,
    pub description: &'static str,
}

impl Endpoint {
    pub fn label(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

/// Every route this service answers
pub const ENDPOINTS: &[Endpoint] = &[
    Endpoint {
        method: "GET",
        path: "/",
        description: "Service banner and version",
    },
    Endpoint {
        method: "GET",
        path: "/api/health",
        description: "Health check with per-service configuration status",
    },
    Endpoint {
        method: "GET",
        path: "/api/models",
        description: "Available text-generation models",
    },
    Endpoint {
        method: "GET",
        path: "/api/docs",
        description: "This endpoint catalog",
    },
    Endpoint {
        method: "POST",
        path: "/api/data",
        description: "Echo the posted JSON body",
    },
    Endpoint {
        method: "POST",
        path: "/api/cohere/inference",
        description: "Generate text from a prompt",
    },
    Endpoint {
        method: "POST",
        path: "/api/gcs/upload",
        description: "Upload a file (multipart field 'file') and get a 24h signed link",
    },
    Endpoint {
        method: "GET",
        path: "/api/gcs/download/:fileName",
        description: "Get a 1h signed download link",
    },
    Endpoint {
        method: "GET",
        path: "/api/gcs/files",
        description: "List all stored files",
    },
    Endpoint {
        method: "DELETE",
        path: "/api/gcs/files/:fileName",
        description: "Delete a stored file",
    },
    Endpoint {
        method: "GET",
        path: "/api/gcs/files/:fileName/metadata",
        description: "Metadata of a stored file",
    },
    Endpoint {
        method: "GET",
        path: "/metrics",
        description: "Prometheus metrics",
    },
];

/// Labels of every documented route, `METHOD /path`
pub fn endpoint_labels() -> Vec<String> {
    ENDPOINTS.iter().map(Endpoint::label).collect()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct IndexPayload {
    pub message: String,
    pub version: String,
}

/// Service banner
#[utoipa::path(
    get,
    path = "/",
    tag = "Info",
    responses((status = 200, description = "Service banner", body = IndexPayload))
)]
pub async fn index() -> Envelope<IndexPayload> {
    success(IndexPayload {
        message: "Cloudbridge API is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Generation models offered through the inference endpoint
const MODELS: &[(&str, &str, &str)] = &[
    (
        "command",
        "Command",
        "Flagship generation model for general instructions",
    ),
    ("command-light", "Command Light", "Smaller, faster variant of Command"),
    (
        "command-nightly",
        "Command Nightly",
        "Latest experimental build of Command",
    ),
    (
        "command-light-nightly",
        "Command Light Nightly",
        "Latest experimental build of Command Light",
    ),
];

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsPayload {
    pub models: Vec<ModelInfo>,
    pub endpoint: String,
    pub description: String,
}

/// Static model catalog
#[utoipa::path(
    get,
    path = "/api/models",
    tag = "Info",
    responses((status = 200, description = "Model catalog", body = ModelsPayload))
)]
pub async fn list_models() -> Envelope<ModelsPayload> {
    success(ModelsPayload {
        models: MODELS
            .iter()
            .map(|(id, name, description)| ModelInfo {
                id: id.to_string(),
                name: name.to_string(),
                description: description.to_string(),
            })
            .collect(),
        endpoint: "/api/cohere/inference".to_string(),
        description: "Pass one of these ids as 'model' in an inference request".to_string(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DocsPayload {
    pub endpoints: BTreeMap<String, String>,
    #[schema(value_type = Object)]
    pub examples: Value,
}

/// Static endpoint catalog with request examples
#[utoipa::path(
    get,
    path = "/api/docs",
    tag = "Info",
    responses((status = 200, description = "Endpoint catalog", body = DocsPayload))
)]
pub async fn api_docs() -> Envelope<DocsPayload> {
    let endpoints = ENDPOINTS
        .iter()
        .map(|e| (e.label(), e.description.to_string()))
        .collect();

    success(DocsPayload {
        endpoints,
        examples: json!({
            "inference": {
                "method": "POST",
                "url": "/api/cohere/inference",
                "body": {
                    "prompt": "Write a haiku about the sea",
                    "model": "command",
                    "max_tokens": 150,
                    "temperature": 0.7
                }
            },
            "upload": {
                "method": "POST",
                "url": "/api/gcs/upload",
                "contentType": "multipart/form-data",
                "field": "file"
            },
            "download": {
                "method": "GET",
                "url": "/api/gcs/download/1704067200000-a1B2c3D4e5.pdf"
            }
        }),
    })
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EchoPayload {
    pub message: String,
    #[schema(value_type = Object)]
    pub received_data: Value,
}

/// Echo the posted JSON body
#[utoipa::path(
    post,
    path = "/api/data",
    tag = "Info",
    request_body(content_type = "application/json", description = "Any JSON value"),
    responses(
        (status = 200, description = "Echoed body", body = EchoPayload),
        (status = 500, description = "Malformed JSON", body = ErrorEnvelope)
    )
)]
pub async fn echo(JsonBody(body): JsonBody<Value>) -> AppResult<Envelope<EchoPayload>> {
    debug!(body = %body, "Echoing request body");

    Ok(success(EchoPayload {
        message: "Data received successfully".to_string(),
        received_data: body,
    }))
}

/// Catch-all for unmatched method and path combinations
pub async fn not_found(method: Method, OriginalUri(uri): OriginalUri) -> Response {
    debug!(method = %method, path = %uri.path(), "No route matched");

    ErrorEnvelope::new(
        "Not Found",
        format!("Route {} {} not found", method, uri.path()),
    )
    .with_endpoints(endpoint_labels())
    .into_response_with(StatusCode::NOT_FOUND)
}
