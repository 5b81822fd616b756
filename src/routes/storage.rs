//! Object-storage endpoints
//!
//! Upload, signed download links, listing, deletion and metadata against the
//! configured bucket. Delete and download check for existence first; list and
//! metadata report whatever the store returns.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        Path, State,
    },
    http::StatusCode,
};
use bytes::{Bytes, BytesMut};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use utoipa::ToSchema;

use crate::{
    envelope::{success, Envelope, ErrorEnvelope},
    error::{AppError, AppResult},
    files::{generated_name, upload_metadata, FileDescriptor, DOWNLOAD_LINK_TTL, UPLOAD_LINK_TTL},
    routes::metrics::{record_uploaded_bytes, record_upstream_call},
    upstream::{NewObject, ObjectStore, SignedUrl, UpstreamError},
    validation::{require_bucket, resolve_content_type, validate_file_type, MAX_UPLOAD_BYTES},
    AppState,
};

/// Multipart field carrying the file
const FILE_FIELD: &str = "file";

/// A file read from the multipart body, already type- and size-checked
#[derive(Debug)]
struct UploadedFile {
    original_name: String,
    content_type: String,
    data: Bytes,
}

fn multipart_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::FileTooLarge
    } else {
        AppError::MalformedUpload(err.body_text())
    }
}

/// Pull the `file` field out of the form
///
/// The type check runs on the part headers before any content is read, and
/// reading stops as soon as the size cap is exceeded.
async fn read_upload(mut multipart: Multipart) -> AppResult<Option<UploadedFile>> {
    while let Some(mut field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A part without a file name is a plain form value, not a file
        let Some(original_name) = field.file_name().map(str::to_string) else {
            continue;
        };

        let content_type = resolve_content_type(&original_name, field.content_type());
        if let Err(err) = validate_file_type(&original_name, &content_type) {
            warn!(file_name = %original_name, content_type = %content_type, "Rejected upload type");
            return Err(err);
        }

        let mut data = BytesMut::new();
        while let Some(chunk) = field.chunk().await.map_err(multipart_error)? {
            if data.len() + chunk.len() > MAX_UPLOAD_BYTES {
                warn!(file_name = %original_name, "Upload exceeds size limit, aborting");
                return Err(AppError::FileTooLarge);
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(Some(UploadedFile {
            original_name,
            content_type,
            data: data.freeze(),
        }));
    }

    Ok(None)
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadPayload {
    pub message: String,
    pub file_name: String,
    pub original_name: String,
    pub size: u64,
    pub mime_type: String,
    /// Read link valid for 24 hours
    pub signed_url: String,
    pub expires_at: String,
}

/// Upload a file and return a 24-hour read link
#[utoipa::path(
    post,
    path = "/api/gcs/upload",
    tag = "Storage",
    request_body(
        content_type = "multipart/form-data",
        description = "Form with a single file part named 'file' (max 10 MiB)"
    ),
    responses(
        (status = 200, description = "File stored", body = UploadPayload),
        (status = 400, description = "No file or disallowed file type", body = ErrorEnvelope),
        (status = 413, description = "File larger than 10 MiB", body = ErrorEnvelope),
        (status = 500, description = "Not configured or storage failure", body = ErrorEnvelope)
    )
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Envelope<UploadPayload>> {
    // Bodies that are not multipart at all simply carry no file
    let upload = match multipart {
        Ok(multipart) => read_upload(multipart).await?,
        Err(rejection) => {
            debug!(reason = %rejection.body_text(), "Upload request is not multipart");
            None
        }
    };
    let upload = upload.ok_or(AppError::MissingFile)?;
    let bucket = require_bucket(&state.config)?;

    let now = Utc::now();
    let object_name = generated_name(&upload.original_name, now);
    let size = upload.data.len() as u64;

    info!(
        bucket = %bucket,
        object_name = %object_name,
        original_name = %upload.original_name,
        size = size,
        "Uploading file"
    );

    let store = &state.object_store;
    let started = Instant::now();
    let result = store
        .put_object(NewObject {
            name: object_name,
            data: upload.data,
            content_type: upload.content_type.clone(),
            metadata: upload_metadata(&upload.original_name, now),
        })
        .await;
    record_upstream_call(store.name(), "put_object", &result, started);
    let stored = result.map_err(|e| AppError::upstream("Failed to upload file", e))?;
    record_uploaded_bytes(size);

    let link = sign(store.as_ref(), &stored.name, UPLOAD_LINK_TTL)
        .await
        .map_err(|e| AppError::upstream("Failed to upload file", e))?;

    Ok(success(UploadPayload {
        message: "File uploaded successfully".to_string(),
        file_name: stored.name,
        original_name: upload.original_name,
        size,
        mime_type: upload.content_type,
        signed_url: link.url,
        expires_at: link.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

async fn sign(
    store: &dyn ObjectStore,
    name: &str,
    ttl: Duration,
) -> Result<SignedUrl, UpstreamError> {
    let started = Instant::now();
    let result = store.signed_url(name, ttl).await;
    record_upstream_call(store.name(), "signed_url", &result, started);
    result
}

/// Existence check shared by delete and download
async fn ensure_exists(store: &dyn ObjectStore, name: &str, context: &'static str) -> AppResult<()> {
    let started = Instant::now();
    let result = store.exists(name).await;
    record_upstream_call(store.name(), "exists", &result, started);

    match result {
        Ok(true) => Ok(()),
        Ok(false) => Err(AppError::NotFound(format!("File '{}' does not exist", name))),
        Err(e) => Err(AppError::upstream(context, e)),
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DownloadPayload {
    pub file_name: String,
    /// Read link valid for 1 hour
    pub download_url: String,
    pub expires_at: String,
}

/// Issue a 1-hour read link for an existing file
#[utoipa::path(
    get,
    path = "/api/gcs/download/{file_name}",
    tag = "Storage",
    params(("file_name" = String, Path, description = "Generated object name")),
    responses(
        (status = 200, description = "Signed link", body = DownloadPayload),
        (status = 404, description = "No such file", body = ErrorEnvelope),
        (status = 500, description = "Not configured or storage failure", body = ErrorEnvelope)
    )
)]
pub async fn download_link(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> AppResult<Envelope<DownloadPayload>> {
    require_bucket(&state.config)?;
    let store = state.object_store.as_ref();
    let context = "Failed to generate download URL";

    ensure_exists(store, &file_name, context).await?;

    let link = sign(store, &file_name, DOWNLOAD_LINK_TTL)
        .await
        .map_err(|e| AppError::upstream(context, e))?;

    debug!(file_name = %file_name, "Issued download link");

    Ok(success(DownloadPayload {
        file_name,
        download_url: link.url,
        expires_at: link.expires_at.to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FileListPayload {
    pub files: Vec<FileDescriptor>,
    pub count: usize,
}

/// List every file in the bucket
#[utoipa::path(
    get,
    path = "/api/gcs/files",
    tag = "Storage",
    responses(
        (status = 200, description = "All stored files", body = FileListPayload),
        (status = 500, description = "Not configured or storage failure", body = ErrorEnvelope)
    )
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
) -> AppResult<Envelope<FileListPayload>> {
    require_bucket(&state.config)?;
    let store = &state.object_store;

    let started = Instant::now();
    let result = store.list_objects().await;
    record_upstream_call(store.name(), "list_objects", &result, started);

    let files: Vec<FileDescriptor> = result
        .map_err(|e| AppError::upstream("Failed to list files", e))?
        .into_iter()
        .map(FileDescriptor::from)
        .collect();

    Ok(success(FileListPayload {
        count: files.len(),
        files,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletePayload {
    pub message: String,
    pub file_name: String,
}

/// Permanently delete an existing file
#[utoipa::path(
    delete,
    path = "/api/gcs/files/{file_name}",
    tag = "Storage",
    params(("file_name" = String, Path, description = "Generated object name")),
    responses(
        (status = 200, description = "File deleted", body = DeletePayload),
        (status = 404, description = "No such file", body = ErrorEnvelope),
        (status = 500, description = "Not configured or storage failure", body = ErrorEnvelope)
    )
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> AppResult<Envelope<DeletePayload>> {
    require_bucket(&state.config)?;
    let store = state.object_store.as_ref();
    let context = "Failed to delete file";

    ensure_exists(store, &file_name, context).await?;

    let started = Instant::now();
    let result = store.delete_object(&file_name).await;
    record_upstream_call(store.name(), "delete_object", &result, started);
    result.map_err(|e| AppError::upstream(context, e))?;

    info!(file_name = %file_name, "File deleted");

    Ok(success(DeletePayload {
        message: "File deleted successfully".to_string(),
        file_name,
    }))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MetadataPayload {
    pub metadata: FileDescriptor,
}

/// Metadata of a file
///
/// No existence check: a missing file surfaces as the store's own error.
#[utoipa::path(
    get,
    path = "/api/gcs/files/{file_name}/metadata",
    tag = "Storage",
    params(("file_name" = String, Path, description = "Generated object name")),
    responses(
        (status = 200, description = "File metadata", body = MetadataPayload),
        (status = 500, description = "Not configured or storage failure, including a missing file", body = ErrorEnvelope)
    )
)]
pub async fn file_metadata(
    State(state): State<Arc<AppState>>,
    Path(file_name): Path<String>,
) -> AppResult<Envelope<MetadataPayload>> {
    require_bucket(&state.config)?;
    let store = &state.object_store;

    let started = Instant::now();
    let result = store.get_metadata(&file_name).await;
    record_upstream_call(store.name(), "get_metadata", &result, started);

    let object = result.map_err(|e| AppError::upstream("Failed to get file metadata", e))?;

    Ok(success(MetadataPayload {
        metadata: object.into(),
    }))
}
