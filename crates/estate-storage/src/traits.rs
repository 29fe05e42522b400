//! The seam between the upload pipeline and wherever bytes end up.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("No object at {0}")]
    NotFound(String),

    #[error("Rejected storage key: {0}")]
    InvalidKey(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Storage misconfigured: {0}")]
    Misconfigured(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable object storage addressed by key.
///
/// The pipeline only needs `put` followed by `durable_url`; the rest serves
/// verification and cleanup. Keys come from [`crate::keys::build_path`] and
/// every backend re-checks them with [`crate::keys::validate_key`].
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write `data` at `storage_key`, replacing any previous object. Once this
    /// returns `Ok` the object is readable at [`Storage::durable_url`].
    async fn put(&self, storage_key: &str, data: Bytes, content_type: &str) -> StorageResult<()>;

    async fn durable_url(&self, storage_key: &str) -> StorageResult<String>;

    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Missing objects are not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    fn backend_type(&self) -> StorageBackend;
}
