//! Persistence provider abstraction
//!
//! This module defines the trait every content-addressable storage backend implements.

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Provider operation errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Pin failed: {0}")]
    PinFailed(String),

    #[error("No healthy persistence provider available")]
    NoProviderAvailable,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Outcome of a successful `add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedContent {
    /// Content identifier returned by the backend.
    pub cid: String,
    /// Hex-encoded SHA-256 of the bytes that were streamed.
    pub content_hash: String,
}

/// Persistence provider trait
///
/// Providers are held in a priority-ordered list and picked by
/// [`crate::ProviderSelector`]; callers never depend on a concrete backend.
#[async_trait]
pub trait PersistenceProvider: Send + Sync {
    /// Stable name recorded on pin records (e.g. "pinata").
    fn name(&self) -> &str;

    /// Stream a local file to the backend without buffering it in memory.
    async fn add(&self, file_path: &Path, filename: &str) -> ProviderResult<AddedContent>;

    /// Ensure durable retention of an identifier previously returned by `add`.
    async fn pin(&self, cid: &str, display_name: &str) -> ProviderResult<()>;

    /// Lightweight authenticated probe. Returns false on any error.
    async fn is_healthy(&self) -> bool;
}
