//! V4 signed read links (`GOOG4-RSA-SHA256`)
//!
//! Signing happens locally with the service-account key; nothing is sent to
//! the storage service.

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use jsonwebtoken::Algorithm;
use reqwest::Url;
use sha2::{Digest, Sha256};

use super::auth::ServiceAccount;
use crate::upstream::UpstreamError;

const ALGORITHM: &str = "GOOG4-RSA-SHA256";
/// Longest lifetime the V4 scheme accepts
pub const MAX_EXPIRY: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Inputs shared by the canonical request and the string to sign
#[derive(Debug, Clone)]
pub(crate) struct SigningScope {
    pub host: String,
    pub canonical_uri: String,
    pub canonical_query: String,
    pub datetime: String,
    pub credential_scope: String,
}

impl SigningScope {
    pub(crate) fn new(
        base: &Url,
        client_email: &str,
        bucket: &str,
        object: &str,
        now: DateTime<Utc>,
        expires_in: Duration,
    ) -> Result<Self, UpstreamError> {
        let host = match (base.host_str(), base.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(UpstreamError::InvalidResponse(format!(
                    "storage URL has no host: {}",
                    base
                )))
            }
        };

        let encoded_object = object
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let canonical_uri = format!("/{}/{}", urlencoding::encode(bucket), encoded_object);

        let datetime = now.format("%Y%m%dT%H%M%SZ").to_string();
        let credential_scope = format!("{}/auto/storage/goog4_request", now.format("%Y%m%d"));
        let credential = format!("{}/{}", client_email, credential_scope);

        // Already in sorted key order
        let params = [
            ("X-Goog-Algorithm", ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", datetime.clone()),
            ("X-Goog-Expires", expires_in.as_secs().to_string()),
            ("X-Goog-SignedHeaders", "host".to_string()),
        ];
        let canonical_query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(Self {
            host,
            canonical_uri,
            canonical_query,
            datetime,
            credential_scope,
        })
    }

    pub(crate) fn canonical_request(&self) -> String {
        format!(
            "GET\n{}\n{}\nhost:{}\n\nhost\nUNSIGNED-PAYLOAD",
            self.canonical_uri, self.canonical_query, self.host
        )
    }

    pub(crate) fn string_to_sign(&self) -> String {
        let digest = hex::encode(Sha256::digest(self.canonical_request().as_bytes()));
        format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM, self.datetime, self.credential_scope, digest
        )
    }
}

/// Produce a signed `GET` link for `bucket/object` valid for `expires_in`
pub fn signed_read_url(
    account: &ServiceAccount,
    base: &Url,
    bucket: &str,
    object: &str,
    now: DateTime<Utc>,
    expires_in: Duration,
) -> Result<String, UpstreamError> {
    let expires_in = expires_in.min(MAX_EXPIRY);
    let scope = SigningScope::new(base, &account.client_email, bucket, object, now, expires_in)?;

    let signature = jsonwebtoken::crypto::sign(
        scope.string_to_sign().as_bytes(),
        &account.signing_key,
        Algorithm::RS256,
    )?;
    let raw = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|e| UpstreamError::InvalidResponse(format!("bad signature encoding: {}", e)))?;

    Ok(format!(
        "{}://{}{}?{}&X-Goog-Signature={}",
        base.scheme(),
        scope.host,
        scope.canonical_uri,
        scope.canonical_query,
        hex::encode(raw)
    ))
}
