//! Error types for Cloudbridge
//!
//! This module defines the handler-facing error taxonomy and its mapping onto
//! HTTP status codes and the error envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::{envelope::ErrorEnvelope, upstream::UpstreamError, validation::MAX_UPLOAD_BYTES};

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("No file uploaded")]
    MissingFile,

    #[error("Invalid file type: {0}")]
    InvalidFileType(String),

    #[error("File exceeds the {} byte limit", MAX_UPLOAD_BYTES)]
    FileTooLarge,

    #[error("Malformed upload: {0}")]
    MalformedUpload(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("{context}: {source}")]
    UpstreamFailure {
        context: &'static str,
        #[source]
        source: UpstreamError,
    },

    /// Anything that escaped a handler's own error handling
    #[error("{0}")]
    Unhandled(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Wrap a vendor failure with the operation that was attempted
    pub fn upstream(context: &'static str, source: UpstreamError) -> Self {
        AppError::UpstreamFailure { context, source }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::MissingField(_)
            | AppError::MissingFile
            | AppError::InvalidFileType(_)
            | AppError::MalformedUpload(_) => StatusCode::BAD_REQUEST,
            AppError::FileTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_)
            | AppError::UpstreamFailure { .. }
            | AppError::Unhandled(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (error, message) = match &self {
            AppError::MissingField(field) => {
                ("Missing required field".to_string(), format!("{} is required", field))
            }
            AppError::MissingFile => (
                "No file uploaded".to_string(),
                "Attach the file as a multipart field named 'file'".to_string(),
            ),
            AppError::InvalidFileType(detail) => ("Invalid file type".to_string(), detail.clone()),
            AppError::FileTooLarge => ("File too large".to_string(), self.to_string()),
            AppError::MalformedUpload(detail) => ("Invalid upload".to_string(), detail.clone()),
            AppError::ServiceUnavailable(detail) => {
                ("Service not configured".to_string(), detail.clone())
            }
            AppError::NotFound(detail) => ("File not found".to_string(), detail.clone()),
            AppError::UpstreamFailure { context, source } => {
                (context.to_string(), source.to_string())
            }
            AppError::Unhandled(detail) => ("Internal server error".to_string(), detail.clone()),
            AppError::Internal(err) => ("Internal server error".to_string(), err.to_string()),
        };

        if status.is_server_error() {
            error!(status = %status, error = %error, message = %message, "Request failed");
        }

        ErrorEnvelope::new(error, message).into_response_with(status)
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
