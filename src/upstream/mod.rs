//! Upstream module
//!
//! Narrow capability interfaces for the two vendors this service proxies to,
//! plus their concrete HTTP clients.

pub mod cohere;
pub mod gcs;
pub mod provider;
pub mod types;

use thiserror::Error;

pub use cohere::CohereClient;
pub use gcs::GcsClient;
pub use provider::{ObjectStore, TextGenerator};
pub use types::{
    GenerationRequest, GenerationResult, NewObject, ObjectMetadata, SignedUrl, TokenUsage,
};

/// Errors raised by upstream clients
///
/// Handlers never inspect these beyond an existence check; they are wrapped
/// into an upstream failure carrying the display message.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("{0} is not configured")]
    NotConfigured(&'static str),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl UpstreamError {
    /// Build a status error from a failed response, preferring the vendor's
    /// own `message` (or `error.message`) field when the body is JSON
    pub(crate) async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let text = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<serde_json::Value>(&text)
            .ok()
            .and_then(|body| {
                body.get("message")
                    .or_else(|| body.get("error").and_then(|e| e.get("message")))
                    .and_then(|m| m.as_str())
                    .map(str::to_string)
            })
            .unwrap_or(text);

        UpstreamError::Status { status, message }
    }
}
