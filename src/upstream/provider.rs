//! Upstream capability traits
//!
//! Handlers only see these traits, so any vendor library can sit behind them
//! without touching request handling.

use std::time::Duration;

use async_trait::async_trait;

use super::{
    types::{GenerationRequest, GenerationResult, NewObject, ObjectMetadata, SignedUrl},
    UpstreamError,
};

/// Hosted text-generation service
///
/// One call is one billable upstream request. Implementations must not
/// retry.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider name for logging and metrics
    fn name(&self) -> &'static str;

    /// Generate a completion for a single prompt
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResult, UpstreamError>;
}

/// Object storage scoped to a single bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Provider name for logging and metrics
    fn name(&self) -> &'static str;

    /// Write an object with its content type and custom metadata
    async fn put_object(&self, object: NewObject) -> Result<ObjectMetadata, UpstreamError>;

    /// Existence check
    async fn exists(&self, name: &str) -> Result<bool, UpstreamError>;

    /// Fetch an object's metadata; a missing object is an error
    async fn get_metadata(&self, name: &str) -> Result<ObjectMetadata, UpstreamError>;

    /// Every object in the bucket, in one batch
    async fn list_objects(&self) -> Result<Vec<ObjectMetadata>, UpstreamError>;

    /// Permanently remove an object
    async fn delete_object(&self, name: &str) -> Result<(), UpstreamError>;

    /// Issue a time-limited read link for an object
    async fn signed_url(&self, name: &str, expires_in: Duration)
        -> Result<SignedUrl, UpstreamError>;
}
