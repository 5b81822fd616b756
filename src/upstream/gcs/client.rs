//! Cloud Storage JSON API client
//!
//! Every operation targets the single configured bucket.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};
use rand::{distr::Alphanumeric, Rng};
use reqwest::{header::CONTENT_TYPE, StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use super::{
    auth::{ServiceAccount, TokenSource},
    signing::signed_read_url,
};
use crate::{
    config::Config,
    upstream::{
        provider::ObjectStore,
        types::{NewObject, ObjectMetadata, SignedUrl},
        UpstreamError,
    },
};

/// Object resource as returned by the JSON API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GcsObject {
    name: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    content_type: Option<String>,
    #[serde(default)]
    time_created: Option<DateTime<Utc>>,
    #[serde(default)]
    updated: Option<DateTime<Utc>>,
    #[serde(default)]
    metadata: Option<HashMap<String, String>>,
}

impl From<GcsObject> for ObjectMetadata {
    fn from(object: GcsObject) -> Self {
        Self {
            size: object
                .size
                .as_deref()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            name: object.name,
            content_type: object.content_type,
            created_at: object.time_created,
            updated_at: object.updated,
            metadata: object.metadata.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ObjectList {
    #[serde(default)]
    items: Vec<GcsObject>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadMetadata<'a> {
    name: &'a str,
    content_type: &'a str,
    metadata: &'a HashMap<String, String>,
}

/// Project the bucket belongs to; explicit configuration wins over the key file
fn project_id<'a>(config: &'a Config, account: Option<&'a ServiceAccount>) -> Option<&'a str> {
    config
        .gcs_project_id
        .as_deref()
        .or_else(|| account.and_then(|a| a.project_id.as_deref()))
}

/// Cloud Storage client bound to one bucket
pub struct GcsClient {
    client: reqwest::Client,
    api_url: String,
    bucket: Option<String>,
    auth: Option<TokenSource>,
}

impl GcsClient {
    /// Create a new client; without an account every call fails upstream
    pub fn new(client: reqwest::Client, config: &Config, account: Option<ServiceAccount>) -> Self {
        let auth = account.map(|account| {
            TokenSource::new(client.clone(), config.gcs_token_url.clone(), Arc::new(account))
        });

        Self {
            client,
            api_url: config.gcs_api_url.trim_end_matches('/').to_string(),
            bucket: config.gcs_bucket_name.clone(),
            auth,
        }
    }

    /// Load credentials from configuration and build the client
    pub fn from_config(client: reqwest::Client, config: &Config) -> anyhow::Result<Self> {
        let account = config
            .gcs_credentials
            .as_ref()
            .map(ServiceAccount::load)
            .transpose()?;

        info!(
            bucket = ?config.gcs_bucket_name,
            project_id = ?project_id(config, account.as_ref()),
            client_email = ?account.as_ref().map(|a| a.client_email.as_str()),
            "Storage client configured"
        );

        Ok(Self::new(client, config, account))
    }

    fn bucket(&self) -> Result<&str, UpstreamError> {
        self.bucket
            .as_deref()
            .ok_or(UpstreamError::NotConfigured("GCS_BUCKET_NAME"))
    }

    fn auth(&self) -> Result<&TokenSource, UpstreamError> {
        self.auth
            .as_ref()
            .ok_or(UpstreamError::NotConfigured("Storage credentials"))
    }

    fn object_url(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.api_url,
            urlencoding::encode(bucket),
            urlencoding::encode(name)
        )
    }

    async fn get_object(&self, name: &str) -> Result<reqwest::Response, UpstreamError> {
        let bucket = self.bucket()?;
        let token = self.auth()?.access_token().await?;

        Ok(self
            .client
            .get(self.object_url(bucket, name))
            .bearer_auth(token)
            .send()
            .await?)
    }

    /// Build a `multipart/related` body: JSON metadata part, then the media
    fn related_body(
        boundary: &str,
        metadata: &[u8],
        content_type: &str,
        data: &[u8],
    ) -> BytesMut {
        let mut body = BytesMut::with_capacity(metadata.len() + data.len() + 256);
        body.put_slice(format!("--{}\r\n", boundary).as_bytes());
        body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.put_slice(metadata);
        body.put_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
        body.put_slice(format!("Content-Type: {}\r\n\r\n", content_type).as_bytes());
        body.put_slice(data);
        body.put_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
        body
    }
}

#[async_trait]
impl ObjectStore for GcsClient {
    fn name(&self) -> &'static str {
        "gcs"
    }

    #[instrument(skip(self, object), fields(name = %object.name, size = object.data.len()))]
    async fn put_object(&self, object: NewObject) -> Result<ObjectMetadata, UpstreamError> {
        let bucket = self.bucket()?;
        let token = self.auth()?.access_token().await?;

        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=multipart",
            self.api_url,
            urlencoding::encode(bucket)
        );
        let metadata = serde_json::to_vec(&UploadMetadata {
            name: &object.name,
            content_type: &object.content_type,
            metadata: &object.metadata,
        })
        .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        let boundary: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let body = Self::related_body(&boundary, &metadata, &object.content_type, &object.data);

        debug!(url = %url, body_len = body.len(), "Uploading object");

        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .header(
                CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body.freeze())
            .send()
            .await?;

        if !response.status().is_success() {
            let err = UpstreamError::from_response(response).await;
            error!(error = %err, "Object upload failed");
            return Err(err);
        }

        let stored: GcsObject = response.json().await?;
        info!(name = %stored.name, bucket = %bucket, "Object stored");
        Ok(stored.into())
    }

    #[instrument(skip(self))]
    async fn exists(&self, name: &str) -> Result<bool, UpstreamError> {
        let response = self.get_object(name).await?;

        match response.status() {
            status if status.is_success() => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            _ => Err(UpstreamError::from_response(response).await),
        }
    }

    #[instrument(skip(self))]
    async fn get_metadata(&self, name: &str) -> Result<ObjectMetadata, UpstreamError> {
        let response = self.get_object(name).await?;

        if !response.status().is_success() {
            return Err(UpstreamError::from_response(response).await);
        }

        let object: GcsObject = response.json().await?;
        Ok(object.into())
    }

    #[instrument(skip(self))]
    async fn list_objects(&self) -> Result<Vec<ObjectMetadata>, UpstreamError> {
        let bucket = self.bucket()?;
        let token = self.auth()?.access_token().await?;
        let url = format!("{}/storage/v1/b/{}/o", self.api_url, urlencoding::encode(bucket));

        let mut objects = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.client.get(&url).bearer_auth(&token);
            if let Some(page) = page_token.as_deref() {
                request = request.query(&[("pageToken", page)]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                return Err(UpstreamError::from_response(response).await);
            }

            let page: ObjectList = response.json().await?;
            objects.extend(page.items.into_iter().map(ObjectMetadata::from));

            match page.next_page_token {
                Some(next) if !next.is_empty() => page_token = Some(next),
                _ => break,
            }
        }

        debug!(count = objects.len(), "Listed bucket");
        Ok(objects)
    }

    #[instrument(skip(self))]
    async fn delete_object(&self, name: &str) -> Result<(), UpstreamError> {
        let bucket = self.bucket()?;
        let token = self.auth()?.access_token().await?;

        let response = self
            .client
            .delete(self.object_url(bucket, name))
            .bearer_auth(token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(UpstreamError::from_response(response).await);
        }

        info!(name = %name, bucket = %bucket, "Object deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn signed_url(
        &self,
        name: &str,
        expires_in: Duration,
    ) -> Result<SignedUrl, UpstreamError> {
        let bucket = self.bucket()?;
        let account = self.auth()?.account();
        let base = Url::parse(&self.api_url)
            .map_err(|e| UpstreamError::InvalidResponse(format!("bad storage URL: {}", e)))?;

        let now = Utc::now();
        let url = signed_read_url(account, &base, bucket, name, now, expires_in)?;
        let expires_at = now
            + chrono::Duration::from_std(expires_in)
                .map_err(|e| UpstreamError::InvalidResponse(e.to_string()))?;

        Ok(SignedUrl {
            url,
            expires_at,
        })
    }
}
