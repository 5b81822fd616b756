//! Request validation
//!
//! Input and configuration checks that run before any upstream call. Each
//! check either yields a validated value or the specific failure to report.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    upstream::types::{
        GenerationRequest, DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_TEMPERATURE,
    },
};

/// Upload size cap (10 MiB)
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Extensions accepted for upload (lowercase, without the dot)
pub const ALLOWED_EXTENSIONS: &[&str] = &[
    "jpeg", "jpg", "png", "gif", "pdf", "txt", "doc", "docx", "xls", "xlsx", "csv", "zip", "rar",
];

/// MIME types accepted for upload
pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "application/pdf",
    "text/plain",
    "text/csv",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "application/vnd.ms-excel",
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
    "application/zip",
    "application/x-zip",
    "application/x-zip-compressed",
    "application/vnd.rar",
    "application/x-rar",
    "application/x-rar-compressed",
];

/// Body of a text-generation request before defaults are applied
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct InferenceRequest {
    /// Text to complete (required)
    pub prompt: Option<String>,
    /// Model identifier, defaults to `command`
    pub model: Option<String>,
    /// Completion length, defaults to 150
    pub max_tokens: Option<u32>,
    /// Sampling temperature, defaults to 0.7
    pub temperature: Option<f64>,
}

/// Fail when no generation credential is configured
pub fn require_generation(config: &Config) -> AppResult<()> {
    if config.generation_configured() {
        Ok(())
    } else {
        Err(AppError::ServiceUnavailable(
            "Cohere API key not configured".to_string(),
        ))
    }
}

/// The configured bucket, or a configuration failure
pub fn require_bucket(config: &Config) -> AppResult<&str> {
    config.gcs_bucket_name.as_deref().ok_or_else(|| {
        AppError::ServiceUnavailable("GCS bucket name not configured".to_string())
    })
}

/// Check the prompt, then the credential, then fill in defaults
pub fn validate_generation(body: InferenceRequest, config: &Config) -> AppResult<GenerationRequest> {
    let prompt = body
        .prompt
        .filter(|p| !p.is_empty())
        .ok_or(AppError::MissingField("prompt"))?;

    require_generation(config)?;

    Ok(GenerationRequest {
        prompt,
        model: body
            .model
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        max_tokens: body.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        temperature: body.temperature.unwrap_or(DEFAULT_TEMPERATURE),
    })
}

/// Lowercased extension of a file name, without the dot
pub fn file_extension(file_name: &str) -> Option<String> {
    std::path::Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| ext.to_ascii_lowercase())
}

/// The declared content type, or one guessed from the extension
pub fn resolve_content_type(file_name: &str, declared: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            mime_guess::from_path(file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        })
}

/// Accept a file only if both its extension and MIME type are allowed
pub fn validate_file_type(file_name: &str, content_type: &str) -> AppResult<()> {
    let extension = file_extension(file_name).unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AppError::InvalidFileType(format!(
            "Extension '{}' is not allowed; accepted: {}",
            extension,
            ALLOWED_EXTENSIONS.join(", ")
        )));
    }

    // Ignore parameters such as "; charset=utf-8"
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    if !ALLOWED_MIME_TYPES.contains(&essence.as_str()) {
        return Err(AppError::InvalidFileType(format!(
            "MIME type '{}' is not allowed",
            essence
        )));
    }

    Ok(())
}
