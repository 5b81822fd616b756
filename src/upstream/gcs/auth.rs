//! Service-account credentials and OAuth2 access tokens for Cloud Storage

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, error, instrument};

use crate::{config::StorageCredentials, upstream::UpstreamError};

const STORAGE_SCOPE: &str = "https://www.googleapis.com/auth/devstorage.full_control";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;
/// Tokens are refreshed this long before the provider says they expire
const REFRESH_MARGIN: Duration = Duration::from_secs(60);

/// A loaded service account able to sign assertions and URLs
#[derive(Clone)]
pub struct ServiceAccount {
    pub client_email: String,
    pub project_id: Option<String>,
    pub(crate) signing_key: EncodingKey,
}

#[derive(Debug, Deserialize)]
struct KeyFile {
    client_email: String,
    private_key: String,
    #[serde(default)]
    project_id: Option<String>,
}

impl ServiceAccount {
    /// Build from a PEM-encoded RSA private key
    pub fn from_pem(client_email: impl Into<String>, private_key_pem: &str) -> Result<Self> {
        let signing_key = EncodingKey::from_rsa_pem(private_key_pem.as_bytes())
            .context("Storage private key is not a valid RSA PEM key")?;

        Ok(Self {
            client_email: client_email.into(),
            project_id: None,
            signing_key,
        })
    }

    /// Read a JSON service-account key file
    pub fn from_key_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file {}", path.display()))?;
        let key: KeyFile = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid service-account key file {}", path.display()))?;

        let mut account = Self::from_pem(key.client_email, &key.private_key)?;
        account.project_id = key.project_id;
        Ok(account)
    }

    /// Resolve whichever credential form was configured
    pub fn load(credentials: &StorageCredentials) -> Result<Self> {
        match credentials {
            StorageCredentials::KeyFile(path) => Self::from_key_file(path),
            StorageCredentials::Inline {
                client_email,
                private_key,
            } => Self::from_pem(client_email.clone(), private_key),
        }
    }
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    value: String,
    refresh_after: Instant,
}

/// Exchanges signed assertions for bearer tokens and reuses them until
/// shortly before expiry
pub struct TokenSource {
    client: reqwest::Client,
    token_url: String,
    account: Arc<ServiceAccount>,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(client: reqwest::Client, token_url: String, account: Arc<ServiceAccount>) -> Self {
        Self {
            client,
            token_url,
            account,
            cached: Mutex::new(None),
        }
    }

    pub fn account(&self) -> &ServiceAccount {
        &self.account
    }

    /// Current access token, fetching a new one when needed
    pub async fn access_token(&self) -> Result<String, UpstreamError> {
        let mut cached = self.cached.lock().await;

        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_after {
                return Ok(token.value.clone());
            }
        }

        let (value, expires_in) = self.fetch().await?;
        let lifetime = Duration::from_secs(expires_in).saturating_sub(REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: value.clone(),
            refresh_after: Instant::now() + lifetime,
        });

        Ok(value)
    }

    fn assertion(&self) -> Result<String, UpstreamError> {
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: &self.account.client_email,
            scope: STORAGE_SCOPE,
            aud: &self.token_url,
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.account.signing_key,
        )?)
    }

    #[instrument(skip(self), fields(client_email = %self.account.client_email))]
    async fn fetch(&self) -> Result<(String, u64), UpstreamError> {
        let assertion = self.assertion()?;

        debug!(token_url = %self.token_url, "Exchanging service-account assertion");

        let response = self
            .client
            .post(&self.token_url)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Token exchange failed");
            return Err(UpstreamError::Auth(format!(
                "token endpoint returned {}: {}",
                status, text
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok((token.access_token, token.expires_in))
    }
}
