//! Google Cloud Storage
//!
//! JSON API client, service-account auth and V4 link signing.

pub mod auth;
pub mod client;
pub mod signing;

pub use auth::{ServiceAccount, TokenSource};
pub use client::GcsClient;
