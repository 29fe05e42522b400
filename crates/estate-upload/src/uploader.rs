//! Hands bytes to the storage backend and returns the durable URL.

use std::sync::Arc;

use estate_core::{AppError, CandidateFile};
use estate_storage::{Storage, StorageError, StoragePath};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no storage backend configured")]
    StorageUnavailable,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::StorageUnavailable => AppError::StorageUnavailable(err.to_string()),
            UploadError::Storage(e) => AppError::UploadFailed {
                message: e.to_string(),
                source: anyhow::Error::new(e),
            },
        }
    }
}

/// An object written by [`Uploader::upload`]. The caller owns it and must
/// record `url` on the owning entity, or it is unreferenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredAsset {
    pub url: String,
    pub key: String,
    pub content_type: String,
    pub size_bytes: u64,
}

#[derive(Clone, Default)]
pub struct Uploader {
    storage: Option<Arc<dyn Storage>>,
}

impl Uploader {
    pub fn new(storage: Option<Arc<dyn Storage>>) -> Self {
        Self { storage }
    }

    pub fn with_storage(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage: Some(storage),
        }
    }

    pub fn unconfigured() -> Self {
        Self { storage: None }
    }

    pub fn is_configured(&self) -> bool {
        self.storage.is_some()
    }

    fn storage(&self) -> Result<&Arc<dyn Storage>, UploadError> {
        self.storage.as_ref().ok_or(UploadError::StorageUnavailable)
    }

    /// Write `file` at `path`. No retries; backend errors are returned as-is.
    pub async fn upload(
        &self,
        file: &CandidateFile,
        path: &StoragePath,
    ) -> Result<StoredAsset, UploadError> {
        let storage = self.storage()?;
        let key = path.as_str();

        storage
            .put(key, file.data.clone(), &file.content_type)
            .await?;
        let url = storage.durable_url(key).await?;

        Ok(StoredAsset {
            url,
            key: key.to_string(),
            content_type: file.content_type.clone(),
            size_bytes: file.data.len() as u64,
        })
    }

    /// Delete an asset that ended up unreferenced.
    pub async fn discard(&self, asset: &StoredAsset) -> Result<(), UploadError> {
        self.storage()?.delete(&asset.key).await?;
        Ok(())
    }
}
