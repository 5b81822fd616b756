//! OpenAPI specification for the Cloudbridge API
//!
//! Aggregates all endpoints and schemas into a single OpenAPI document.
//! Success payloads are documented unwrapped; on the wire each is flattened
//! into an envelope with `success: true` and `timestamp`.

use utoipa::OpenApi;

use crate::{
    envelope::ErrorEnvelope,
    files::FileDescriptor,
    routes::{
        catalog::{DocsPayload, EchoPayload, IndexPayload, ModelInfo, ModelsPayload},
        health::{HealthPayload, ServiceStatus, ServicesStatus},
        inference::{InferencePayload, UsagePayload},
        storage::{DeletePayload, DownloadPayload, FileListPayload, MetadataPayload, UploadPayload},
    },
    validation::InferenceRequest,
};

/// OpenAPI specification for Cloudbridge
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Cloudbridge API",
        version = "0.1.0",
        description = "JSON proxy for Cohere text generation and Google Cloud Storage files"
    ),
    paths(
        crate::routes::catalog::index,
        crate::routes::health::health_check,
        crate::routes::catalog::list_models,
        crate::routes::catalog::api_docs,
        crate::routes::catalog::echo,
        crate::routes::inference::generate_text,
        crate::routes::storage::upload_file,
        crate::routes::storage::download_link,
        crate::routes::storage::list_files,
        crate::routes::storage::delete_file,
        crate::routes::storage::file_metadata,
    ),
    components(
        schemas(
            // Info
            IndexPayload,
            ModelInfo,
            ModelsPayload,
            DocsPayload,
            EchoPayload,
            ServiceStatus,
            ServicesStatus,
            HealthPayload,
            // Generation
            InferenceRequest,
            UsagePayload,
            InferencePayload,
            // Storage
            FileDescriptor,
            UploadPayload,
            DownloadPayload,
            FileListPayload,
            DeletePayload,
            MetadataPayload,
            // Error
            ErrorEnvelope,
        )
    ),
    tags(
        (name = "Info", description = "Service information endpoints"),
        (name = "Generation", description = "Text generation"),
        (name = "Storage", description = "File storage")
    )
)]
pub struct ApiDoc;
