//! Stored-file naming and descriptors

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use rand::{distr::Alphanumeric, Rng};
use serde::Serialize;
use utoipa::ToSchema;

use crate::upstream::types::ObjectMetadata;

/// Lifetime of the link returned right after an upload
pub const UPLOAD_LINK_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Lifetime of a download link
pub const DOWNLOAD_LINK_TTL: Duration = Duration::from_secs(60 * 60);

/// Custom metadata key holding the client's file name
pub const ORIGINAL_NAME_KEY: &str = "originalName";
/// Custom metadata key holding the upload time
pub const UPLOADED_AT_KEY: &str = "uploadedAt";

const TOKEN_LEN: usize = 10;

/// Server-assigned object name: `<epoch millis>-<random token>.<extension>`
///
/// Uniqueness is probabilistic. The original extension is kept as given.
pub fn generated_name(original_name: &str, now: DateTime<Utc>) -> String {
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect();

    match std::path::Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(ext) if !ext.is_empty() => {
            format!("{}-{}.{}", now.timestamp_millis(), token, ext)
        }
        _ => format!("{}-{}", now.timestamp_millis(), token),
    }
}

/// Custom metadata written alongside an uploaded object
pub fn upload_metadata(original_name: &str, now: DateTime<Utc>) -> HashMap<String, String> {
    HashMap::from([
        (ORIGINAL_NAME_KEY.to_string(), original_name.to_string()),
        (
            UPLOADED_AT_KEY.to_string(),
            now.to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
    ])
}

/// A stored object as presented to clients
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileDescriptor {
    /// Generated object name
    pub file_name: String,
    /// Name the file was uploaded with, or the generated name when unknown
    pub original_name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    /// Custom metadata stored with the object
    pub metadata: HashMap<String, String>,
}

impl From<ObjectMetadata> for FileDescriptor {
    fn from(object: ObjectMetadata) -> Self {
        let original_name = object
            .metadata
            .get(ORIGINAL_NAME_KEY)
            .cloned()
            .unwrap_or_else(|| object.name.clone());
        let stamp = |t: DateTime<Utc>| t.to_rfc3339_opts(SecondsFormat::Millis, true);

        Self {
            file_name: object.name,
            original_name,
            size: object.size,
            content_type: object.content_type,
            created_at: object.created_at.map(stamp),
            updated_at: object.updated_at.map(stamp),
            metadata: object.metadata,
        }
    }
}
