//! Cohere generate client
//!
//! Forwards single-prompt completions to Cohere's `/generate` endpoint.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use super::{
    provider::TextGenerator,
    types::{GenerationRequest, GenerationResult, TokenUsage},
    UpstreamError,
};
use crate::config::Config;

/// Body sent to `/generate`
#[derive(Debug, Serialize)]
struct GenerateBody<'a> {
    prompt: &'a str,
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    /// Top-k sampling disabled
    k: u32,
    stop_sequences: Vec<String>,
    return_likelihoods: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    generations: Vec<Generation>,
    #[serde(default)]
    meta: Option<GenerateMeta>,
}

#[derive(Debug, Deserialize)]
struct Generation {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateMeta {
    #[serde(default)]
    billed_units: Option<BilledUnits>,
}

#[derive(Debug, Deserialize)]
struct BilledUnits {
    input_tokens: Option<f64>,
    output_tokens: Option<f64>,
}

impl From<Option<GenerateMeta>> for TokenUsage {
    fn from(meta: Option<GenerateMeta>) -> Self {
        let units = meta.and_then(|m| m.billed_units);
        let prompt = units.as_ref().and_then(|u| u.input_tokens).map(|v| v as u64);
        let completion = units.as_ref().and_then(|u| u.output_tokens).map(|v| v as u64);
        let total = match (prompt, completion) {
            (Some(p), Some(c)) => Some(p + c),
            _ => None,
        };

        TokenUsage {
            prompt,
            completion,
            total,
        }
    }
}

/// Cohere API client
pub struct CohereClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CohereClient {
    /// Create a new Cohere client
    pub fn new(client: reqwest::Client, config: &Config) -> Self {
        Self {
            client,
            base_url: config.cohere_api_url.trim_end_matches('/').to_string(),
            api_key: config.cohere_api_key.clone(),
        }
    }

    fn headers(&self, api_key: &str) -> Result<HeaderMap, UpstreamError> {
        let mut headers = HeaderMap::new();
        let bearer = HeaderValue::from_str(&format!("Bearer {}", api_key))
            .map_err(|_| UpstreamError::Auth("API key contains invalid characters".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl TextGenerator for CohereClient {
    fn name(&self) -> &'static str {
        "cohere"
    }

    #[instrument(skip(self, request), fields(model = %request.model, max_tokens = request.max_tokens))]
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResult, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("COHERE_API_KEY"))?;

        let url = format!("{}/generate", self.base_url);
        let body = GenerateBody {
            prompt: &request.prompt,
            model: &request.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            k: 0,
            stop_sequences: Vec::new(),
            return_likelihoods: "NONE",
        };

        debug!(url = %url, prompt_len = request.prompt.len(), "Sending generate request to Cohere");

        let response = self
            .client
            .post(&url)
            .headers(self.headers(api_key)?)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let err = UpstreamError::from_response(response).await;
            error!(error = %err, "Cohere generate request failed");
            return Err(err);
        }

        let parsed: GenerateResponse = response.json().await?;
        let text = parsed
            .generations
            .into_iter()
            .next()
            .map(|g| g.text)
            .ok_or_else(|| UpstreamError::InvalidResponse("no generations returned".to_string()))?;

        Ok(GenerationResult {
            text,
            model: request.model.clone(),
            usage: parsed.meta.into(),
        })
    }
}
