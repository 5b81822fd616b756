//! Request-scoped values exchanged with upstream services

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Default generation model
pub const DEFAULT_MODEL: &str = "command";
/// Default completion length
pub const DEFAULT_MAX_TOKENS: u32 = 150;
/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// A validated, defaulted text-generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f64,
}

/// Token accounting reported by the provider; any part may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub prompt: Option<u64>,
    pub completion: Option<u64>,
    pub total: Option<u64>,
}

/// Result of a text-generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub text: String,
    pub model: String,
    pub usage: TokenUsage,
}

/// An object about to be written
#[derive(Debug, Clone)]
pub struct NewObject {
    pub name: String,
    pub data: Bytes,
    pub content_type: String,
    pub metadata: HashMap<String, String>,
}

/// Metadata of a stored object as reported by the store
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectMetadata {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub metadata: HashMap<String, String>,
}

/// A pre-authenticated read link issued by the store
#[derive(Debug, Clone, PartialEq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}
