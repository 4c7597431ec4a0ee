//! Durable blob-store port.
//!
//! The [`BlobStore`] trait is the only persistence surface the catalog
//! needs: a named string value that can be read and replaced. Backends
//! are pluggable (in-memory here, file-backed in the application crate).
//!
//! Implementations must be `Send + Sync` so a store can live inside an
//! async runtime.

pub mod memory;

use async_trait::async_trait;
use thiserror::Error;

pub use memory::InMemoryBlobStore;

/// Failure reported by a [`BlobStore`] backend.
#[derive(Debug, Error)]
pub enum BlobError {
    /// Writing the value would exceed the backend's byte budget.
    #[error("storage quota exceeded for '{key}': {needed} bytes needed, {quota} allowed")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("blob store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("blob store backend error: {0}")]
    Backend(String),
}

/// Named-value persistence scoped to one user/device.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](BlobStore::get) | Read the value under a key, if any |
/// | [`set`](BlobStore::set) | Replace the value under a key |
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, BlobError>;

    /// Replace the value under `key`. On error the previous value must
    /// still be readable.
    async fn set(&self, key: &str, value: &str) -> Result<(), BlobError>;
}
