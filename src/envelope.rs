//! Response envelopes
//!
//! Every endpoint answers with one of two fixed JSON shapes: a success
//! envelope (`success: true`, the payload fields, `timestamp`) or an error
//! envelope (`error`, `message`, `timestamp`).

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use utoipa::ToSchema;

/// Current time as an RFC 3339 UTC string with millisecond precision
pub fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Success envelope wrapping a payload
///
/// The payload's fields are flattened into the top-level object. All
/// successes are sent with 200, creations included.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
    pub timestamp: String,
}

/// Wrap a payload in a success envelope stamped with the current time
pub fn success<T: Serialize>(data: T) -> Envelope<T> {
    Envelope {
        success: true,
        data,
        timestamp: now_timestamp(),
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Error envelope
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorEnvelope {
    /// Short description of what failed
    pub error: String,
    /// Detail, usually the underlying cause
    pub message: String,
    /// Only present on the catch-all 404
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_endpoints: Option<Vec<String>>,
    pub timestamp: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            available_endpoints: None,
            timestamp: now_timestamp(),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Vec<String>) -> Self {
        self.available_endpoints = Some(endpoints);
        self
    }

    /// Pair the envelope with a status code
    pub fn into_response_with(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}
