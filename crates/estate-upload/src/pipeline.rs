//! Upload pipeline: (validate →) compress → build path → store.
//!
//! Each step runs exactly once per call and strictly in order. Forms validate
//! at selection time and call [`UploadPipeline::store`]; one-shot callers such
//! as the CLI use [`UploadPipeline::validate_and_store`].

use std::sync::Arc;

use anyhow::Context;
use estate_core::{AppError, AssetCategory, CandidateFile, Config};
use estate_processing::{Compressor, ImageCompressor, MediaValidator};
use estate_storage::{build_path, create_storage};

use crate::uploader::{StoredAsset, Uploader};

#[derive(Clone)]
pub struct UploadPipeline {
    compressor: Arc<dyn Compressor>,
    uploader: Uploader,
}

impl UploadPipeline {
    pub fn new(compressor: Arc<dyn Compressor>, uploader: Uploader) -> Self {
        Self {
            compressor,
            uploader,
        }
    }

    /// Storage from the configured backend and an image compressor using the
    /// configured settings. An unset backend yields a pipeline whose uploads
    /// fail with `StorageUnavailable`.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let storage = create_storage(config)
            .await
            .context("Failed to initialise storage backend")?;

        Ok(Self::new(
            Arc::new(ImageCompressor::new(config.compression)),
            Uploader::new(storage),
        ))
    }

    pub fn uploader(&self) -> &Uploader {
        &self.uploader
    }

    /// Compress, derive the key from the (possibly renamed) file, upload.
    /// The compressed result is not validated again.
    pub async fn store(
        &self,
        file: CandidateFile,
        category: AssetCategory,
        prefix: &str,
        entity_id: Option<&str>,
    ) -> Result<StoredAsset, AppError> {
        let start = std::time::Instant::now();
        let original_size = file.size;

        let file = self.compressor.maybe_compress(file).await;
        let path = build_path(category, entity_id, prefix, &file.name);

        let asset = self.uploader.upload(&file, &path).await?;

        tracing::info!(
            category = %category,
            key = %asset.key,
            original_size,
            size_bytes = asset.size_bytes,
            unassigned = path.is_unassigned(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Upload pipeline completed"
        );

        Ok(asset)
    }

    pub async fn validate_and_store(
        &self,
        validator: &MediaValidator,
        file: CandidateFile,
        category: AssetCategory,
        prefix: &str,
        entity_id: Option<&str>,
    ) -> Result<StoredAsset, AppError> {
        validator.check(&file)?;
        self.store(file, category, prefix, entity_id).await
    }
}
