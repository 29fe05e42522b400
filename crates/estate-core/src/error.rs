//! Error types module
//!
//! `UploadErrorKind` is the closed, user-facing taxonomy every form displays.
//! `AppError` is the richer error carried through the pipeline; it keeps the
//! underlying cause for diagnostics and maps onto a kind for display.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues
    Warn,
    /// Error level - for unexpected failures and misconfiguration
    Error,
}

/// Error kinds shown to the user by upload forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UploadErrorKind {
    ImageTypeInvalid,
    ImageSizeTooLarge,
    DocumentTypeInvalid,
    DocumentSizeTooLarge,
    StorageUnavailable,
    GenericUploadFailure,
    PersistFailed,
}

impl UploadErrorKind {
    /// Validation kinds are detected before any network activity and are
    /// always recoverable by picking another file.
    pub fn is_validation(self) -> bool {
        matches!(
            self,
            UploadErrorKind::ImageTypeInvalid
                | UploadErrorKind::ImageSizeTooLarge
                | UploadErrorKind::DocumentTypeInvalid
                | UploadErrorKind::DocumentSizeTooLarge
        )
    }

    /// The kind an end user sees. Storage misconfiguration is reported as a
    /// generic failure; logs keep the distinction.
    pub fn for_display(self) -> Self {
        match self {
            UploadErrorKind::StorageUnavailable => UploadErrorKind::GenericUploadFailure,
            other => other,
        }
    }

    /// Stable message key for the UI's string table.
    pub fn message_key(self) -> &'static str {
        match self {
            UploadErrorKind::ImageTypeInvalid => "upload.image_type_invalid",
            UploadErrorKind::ImageSizeTooLarge => "upload.image_size_too_large",
            UploadErrorKind::DocumentTypeInvalid => "upload.document_type_invalid",
            UploadErrorKind::DocumentSizeTooLarge => "upload.document_size_too_large",
            UploadErrorKind::StorageUnavailable => "upload.storage_unavailable",
            UploadErrorKind::GenericUploadFailure => "upload.failed",
            UploadErrorKind::PersistFailed => "upload.save_failed",
        }
    }
}

impl Display for UploadErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let text = match self {
            UploadErrorKind::ImageTypeInvalid => "Image type not allowed",
            UploadErrorKind::ImageSizeTooLarge => "Image exceeds the size limit",
            UploadErrorKind::DocumentTypeInvalid => "Document type not allowed",
            UploadErrorKind::DocumentSizeTooLarge => "Document exceeds the size limit",
            UploadErrorKind::StorageUnavailable => "Storage is not configured",
            UploadErrorKind::GenericUploadFailure => "Upload failed",
            UploadErrorKind::PersistFailed => "Saving failed",
        };
        f.write_str(text)
    }
}

/// Metadata for error reporting - lets errors self-describe how they are
/// logged and presented.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "STORAGE_UNAVAILABLE")
    fn error_code(&self) -> &'static str;

    /// Whether the user can recover by retrying or choosing another file
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Validation failed: {0}")]
    Validation(UploadErrorKind),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Upload failed: {message}")]
    UploadFailed {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Persisting entity failed: {0}")]
    PersistFailed(String),
}

impl AppError {
    /// Taxonomy kind before display mapping.
    pub fn kind(&self) -> UploadErrorKind {
        match self {
            AppError::Validation(kind) => *kind,
            AppError::StorageUnavailable(_) => UploadErrorKind::StorageUnavailable,
            AppError::PersistFailed(_) => UploadErrorKind::PersistFailed,
            AppError::UploadFailed { .. } => UploadErrorKind::GenericUploadFailure,
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_FAILED",
            AppError::StorageUnavailable(_) => "STORAGE_UNAVAILABLE",
            AppError::UploadFailed { .. } => "UPLOAD_FAILED",
            AppError::PersistFailed(_) => "PERSIST_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, AppError::StorageUnavailable(_))
    }

    fn client_message(&self) -> String {
        match self {
            AppError::PersistFailed(msg) if !msg.is_empty() => msg.clone(),
            other => other.kind().for_display().to_string(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            AppError::Validation(_) => LogLevel::Debug,
            AppError::UploadFailed { .. } | AppError::PersistFailed(_) => LogLevel::Warn,
            AppError::StorageUnavailable(_) => LogLevel::Error,
        }
    }
}
