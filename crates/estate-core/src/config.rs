//! Configuration module
//!
//! Settings are read from the environment (a `.env` file is honoured via
//! `dotenvy`). Storage is optional: with no `STORAGE_BACKEND` the pipeline
//! still validates and compresses, but every upload reports
//! `StorageUnavailable`.

use std::env;

use crate::constants::{
    COMPRESS_JPEG_QUALITY, COMPRESS_MAX_DIMENSION, COMPRESS_THRESHOLD_BYTES,
    MAX_DOCUMENT_SIZE_BYTES, MAX_IMAGE_SIZE_BYTES,
};
use crate::storage_types::StorageBackend;

const MEMORY_STORAGE_BASE_URL: &str = "memory://estate";

/// Tuning for the image compressor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompressionSettings {
    /// Files strictly larger than this are compressed.
    pub threshold_bytes: u64,
    /// Neither output side exceeds this many pixels.
    pub max_dimension: u32,
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for CompressionSettings {
    fn default() -> Self {
        Self {
            threshold_bytes: COMPRESS_THRESHOLD_BYTES,
            max_dimension: COMPRESS_MAX_DIMENSION,
            jpeg_quality: COMPRESS_JPEG_QUALITY,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub log_format: String,
    // Storage configuration
    pub storage_backend: Option<StorageBackend>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // Custom endpoint for S3-compatible providers (MinIO, etc.)
    pub aws_region: Option<String>,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub memory_storage_base_url: String,
    // Upload limits
    pub max_image_size_bytes: u64,
    pub max_document_size_bytes: u64,
    pub compression: CompressionSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            log_format: "text".to_string(),
            storage_backend: None,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            aws_region: None,
            local_storage_path: None,
            local_storage_base_url: None,
            memory_storage_base_url: MEMORY_STORAGE_BASE_URL.to_string(),
            max_image_size_bytes: MAX_IMAGE_SIZE_BYTES,
            max_document_size_bytes: MAX_DOCUMENT_SIZE_BYTES,
            compression: CompressionSettings::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_source(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. `from_env` passes `std::env::var`.
    pub fn from_source<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or(defaults.environment);

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) if !value.trim().is_empty() => Some(value.trim().parse()?),
            _ => None,
        };

        let parse_u64 = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let compression = CompressionSettings {
            threshold_bytes: parse_u64(
                "COMPRESS_THRESHOLD_BYTES",
                defaults.compression.threshold_bytes,
            ),
            max_dimension: lookup("COMPRESS_MAX_DIMENSION")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.compression.max_dimension),
            jpeg_quality: lookup("COMPRESS_JPEG_QUALITY")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.compression.jpeg_quality),
        };

        Ok(Config {
            environment,
            log_format: lookup("LOG_FORMAT")
                .map(|s| s.to_lowercase())
                .unwrap_or(defaults.log_format),
            storage_backend,
            s3_bucket: lookup("S3_BUCKET"),
            s3_region: lookup("S3_REGION"),
            s3_endpoint: lookup("S3_ENDPOINT"),
            aws_region: lookup("AWS_REGION"),
            local_storage_path: lookup("LOCAL_STORAGE_PATH"),
            local_storage_base_url: lookup("LOCAL_STORAGE_BASE_URL"),
            memory_storage_base_url: lookup("MEMORY_STORAGE_BASE_URL")
                .unwrap_or(defaults.memory_storage_base_url),
            max_image_size_bytes: parse_u64("MAX_IMAGE_SIZE_BYTES", defaults.max_image_size_bytes),
            max_document_size_bytes: parse_u64(
                "MAX_DOCUMENT_SIZE_BYTES",
                defaults.max_document_size_bytes,
            ),
            compression,
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_image_size_bytes == 0 || self.max_document_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size limits must be greater than zero"));
        }

        if self.compression.max_dimension == 0 {
            return Err(anyhow::anyhow!("COMPRESS_MAX_DIMENSION must be greater than zero"));
        }

        if !(1..=100).contains(&self.compression.jpeg_quality) {
            return Err(anyhow::anyhow!("COMPRESS_JPEG_QUALITY must be between 1 and 100"));
        }

        // Missing storage is allowed; uploads then fail with StorageUnavailable.
        match self.storage_backend {
            Some(StorageBackend::S3) => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 storage backend"
                    ));
                }
                if self.s3_region.is_none() && self.aws_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 storage backend"
                    ));
                }
            }
            Some(StorageBackend::Local) => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local storage backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local storage backend"
                    ));
                }
            }
            Some(StorageBackend::Memory) => {
                if self.is_production() {
                    return Err(anyhow::anyhow!(
                        "memory storage backend cannot be used in production"
                    ));
                }
            }
            None => {}
        }

        Ok(())
    }

    // Convenience getters used by the storage factory
    pub fn storage_backend(&self) -> Option<StorageBackend> {
        self.storage_backend
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn aws_region(&self) -> Option<&str> {
        self.aws_region.as_deref()
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.local_storage_base_url.as_deref()
    }

    pub fn memory_storage_base_url(&self) -> &str {
        &self.memory_storage_base_url
    }
}
