//! Configuration management for Cloudbridge
//!
//! Configuration is loaded from environment variables. Empty values are
//! treated the same as unset ones.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Default Cohere API base URL
pub const DEFAULT_COHERE_API_URL: &str = "https://api.cohere.ai/v1";
/// Default Google Cloud Storage API base URL
pub const DEFAULT_GCS_API_URL: &str = "https://storage.googleapis.com";
/// Default Google OAuth2 token endpoint
pub const DEFAULT_GCS_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Where the storage service-account credentials come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageCredentials {
    /// Path to a service-account key file (JSON)
    KeyFile(PathBuf),
    /// Client email and PEM private key supplied directly
    Inline {
        client_email: String,
        private_key: String,
    },
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,

    /// Cohere API base URL
    pub cohere_api_url: String,
    /// Cohere API key (generation is unavailable without it)
    pub cohere_api_key: Option<String>,

    /// Bucket all storage operations target
    pub gcs_bucket_name: Option<String>,
    /// Google Cloud project id
    pub gcs_project_id: Option<String>,
    /// Service-account credentials for the storage API
    pub gcs_credentials: Option<StorageCredentials>,
    /// Storage JSON API base URL (also the host of signed links)
    pub gcs_api_url: String,
    /// OAuth2 token endpoint used for the service-account exchange
    pub gcs_token_url: String,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: get("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse()
                .context("Invalid PORT")?,

            cohere_api_url: get("COHERE_API_URL")
                .unwrap_or_else(|| DEFAULT_COHERE_API_URL.to_string()),
            cohere_api_key: get("COHERE_API_KEY"),

            gcs_bucket_name: get("GCS_BUCKET_NAME"),
            gcs_project_id: get("GCS_PROJECT_ID").or_else(|| get("GOOGLE_CLOUD_PROJECT_ID")),
            gcs_credentials: resolve_credentials(&get),
            gcs_api_url: get("GCS_API_URL")
                .unwrap_or_else(|| DEFAULT_GCS_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            gcs_token_url: get("GCS_TOKEN_URL")
                .unwrap_or_else(|| DEFAULT_GCS_TOKEN_URL.to_string()),

            log_format: match get("LOG_FORMAT").as_deref() {
                Some("json") => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        })
    }

    /// Whether a generation credential is present
    pub fn generation_configured(&self) -> bool {
        self.cohere_api_key.is_some()
    }

    /// Whether a bucket name is present
    pub fn storage_configured(&self) -> bool {
        self.gcs_bucket_name.is_some()
    }
}

/// Pick the first complete credential source, key file first
fn resolve_credentials<F>(get: &F) -> Option<StorageCredentials>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(path) = get("GOOGLE_APPLICATION_CREDENTIALS") {
        return Some(StorageCredentials::KeyFile(PathBuf::from(path)));
    }

    let pairs = [
        ("GCS_CLIENT_EMAIL", "GCS_PRIVATE_KEY"),
        ("GOOGLE_CLOUD_CLIENT_EMAIL", "GOOGLE_CLOUD_PRIVATE_KEY"),
    ];

    pairs.iter().find_map(|(email_key, key_key)| {
        match (get(email_key), get(key_key)) {
            (Some(client_email), Some(private_key)) => Some(StorageCredentials::Inline {
                client_email,
                // Keys pasted into .env files usually carry escaped newlines
                private_key: private_key.replace("\\n", "\n"),
            }),
            _ => None,
        }
    })
}
