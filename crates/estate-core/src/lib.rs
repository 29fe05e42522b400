//! Estate Core Library
//!
//! Core types, error taxonomy, limits and configuration shared by every
//! crate of the media-upload pipeline.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{CompressionSettings, Config};
pub use error::{AppError, ErrorMetadata, LogLevel, UploadErrorKind};
pub use models::{AssetCategory, CandidateFile, MediaKind, PersistResponse};
pub use storage_types::StorageBackend;
