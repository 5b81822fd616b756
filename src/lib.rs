//! Cloudbridge - JSON proxy for Cohere text generation and Google Cloud Storage
//!
//! This library provides the core functionality for the Cloudbridge server.
//! It validates requests, forwards them to the text-generation and
//! object-storage vendors, and wraps every answer in a uniform JSON envelope.

pub mod config;
pub mod docs;
pub mod envelope;
pub mod error;
pub mod files;
pub mod routes;
pub mod upstream;
pub mod validation;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

pub use crate::config::Config;
pub use crate::error::{AppError, AppResult};
pub use crate::upstream::{CohereClient, GcsClient, ObjectStore, TextGenerator};

/// Application state shared across all request handlers
pub struct AppState {
    pub config: Config,
    pub start_time: Instant,
    /// Text-generation backend
    pub text_generator: Arc<dyn TextGenerator>,
    /// Object-storage backend for the configured bucket
    pub object_store: Arc<dyn ObjectStore>,
}

impl AppState {
    /// Create a new application state
    ///
    /// Missing vendor credentials are not an error here; the affected
    /// endpoints report "not configured" per request instead. A storage key
    /// file that is named but unreadable is a startup error.
    pub fn new(config: Config) -> Result<Self> {
        // Initialize HTTP client with connection pooling
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(32)
            .build()?;

        let text_generator: Arc<dyn TextGenerator> =
            Arc::new(CohereClient::new(http_client.clone(), &config));

        let object_store: Arc<dyn ObjectStore> =
            Arc::new(GcsClient::from_config(http_client, &config)?);

        Ok(Self {
            config,
            start_time: Instant::now(),
            text_generator,
            object_store,
        })
    }

    /// Create a new application state with injected backends
    ///
    /// Used by the integration tests to swap in in-memory fakes or clients
    /// pointed at wiremock servers.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn new_for_testing(
        config: Config,
        text_generator: Arc<dyn TextGenerator>,
        object_store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            start_time: Instant::now(),
            text_generator,
            object_store,
        }
    }
}
