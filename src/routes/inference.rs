//! Text-generation endpoint

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use serde::Serialize;
use tracing::info;
use utoipa::ToSchema;

use crate::{
    envelope::{success, Envelope, ErrorEnvelope},
    error::{AppError, AppResult},
    routes::{extract::JsonBody, metrics::record_upstream_call},
    upstream::TokenUsage,
    validation::{validate_generation, InferenceRequest},
    AppState,
};

/// Token usage as reported upstream; absent parts are null
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UsagePayload {
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub total_tokens: Option<u64>,
}

impl From<TokenUsage> for UsagePayload {
    fn from(usage: TokenUsage) -> Self {
        Self {
            prompt_tokens: usage.prompt,
            completion_tokens: usage.completion,
            total_tokens: usage.total,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct InferencePayload {
    /// Generated text
    pub response: String,
    pub model: String,
    pub usage: UsagePayload,
}

/// Generate text for a prompt
///
/// The prompt is checked before the credential; neither failure reaches
/// the provider.
#[utoipa::path(
    post,
    path = "/api/cohere/inference",
    tag = "Generation",
    request_body = InferenceRequest,
    responses(
        (status = 200, description = "Generated text", body = InferencePayload),
        (status = 400, description = "Prompt missing", body = ErrorEnvelope),
        (status = 500, description = "Not configured or provider failure", body = ErrorEnvelope)
    )
)]
pub async fn generate_text(
    State(state): State<Arc<AppState>>,
    JsonBody(body): JsonBody<InferenceRequest>,
) -> AppResult<Envelope<InferencePayload>> {
    let request = validate_generation(body, &state.config)?;

    info!(
        model = %request.model,
        max_tokens = request.max_tokens,
        temperature = request.temperature,
        "Processing inference request"
    );

    let started = Instant::now();
    let result = state.text_generator.generate(&request).await;
    record_upstream_call(state.text_generator.name(), "generate", &result, started);

    let generation = result.map_err(|e| AppError::upstream("Failed to generate text", e))?;

    Ok(success(InferencePayload {
        response: generation.text,
        model: generation.model,
        usage: generation.usage.into(),
    }))
}
