use estate_core::models::normalize_content_type;
use estate_core::{AppError, CandidateFile, Config, MediaKind, UploadErrorKind};

/// Reasons a selected file is rejected before anything is uploaded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid image type: {content_type}")]
    ImageTypeInvalid { content_type: String },

    #[error("Image too large: {size} bytes (max: {max} bytes)")]
    ImageSizeTooLarge { size: u64, max: u64 },

    #[error("Invalid document type: {content_type}")]
    DocumentTypeInvalid { content_type: String },

    #[error("Document too large: {size} bytes (max: {max} bytes)")]
    DocumentSizeTooLarge { size: u64, max: u64 },
}

impl ValidationError {
    pub fn kind(&self) -> UploadErrorKind {
        match self {
            ValidationError::ImageTypeInvalid { .. } => UploadErrorKind::ImageTypeInvalid,
            ValidationError::ImageSizeTooLarge { .. } => UploadErrorKind::ImageSizeTooLarge,
            ValidationError::DocumentTypeInvalid { .. } => UploadErrorKind::DocumentTypeInvalid,
            ValidationError::DocumentSizeTooLarge { .. } => UploadErrorKind::DocumentSizeTooLarge,
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.kind())
    }
}

/// Outcome of [`validate`]: either valid, or the first violated rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub error_kind: Option<UploadErrorKind>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            valid: true,
            error_kind: None,
        }
    }

    pub fn rejected(kind: UploadErrorKind) -> Self {
        Self {
            valid: false,
            error_kind: Some(kind),
        }
    }
}

impl From<Result<(), ValidationError>> for ValidationResult {
    fn from(result: Result<(), ValidationError>) -> Self {
        match result {
            Ok(()) => ValidationResult::ok(),
            Err(e) => ValidationResult::rejected(e.kind()),
        }
    }
}

/// Media file validator
///
/// Checks declared content type, then declared size. The first violation
/// wins: a file with a disallowed type is reported as such whatever its size.
#[derive(Debug, Clone)]
pub struct MediaValidator {
    kind: MediaKind,
    max_file_size: u64,
    allowed_content_types: Vec<String>,
}

impl MediaValidator {
    pub fn new(kind: MediaKind, max_file_size: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            kind,
            max_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.to_lowercase())
                .collect(),
        }
    }

    /// Validator with the built-in limits for `kind`.
    pub fn for_kind(kind: MediaKind) -> Self {
        Self::from_config(kind, &Config::default())
    }

    pub fn from_config(kind: MediaKind, config: &Config) -> Self {
        let max = match kind {
            MediaKind::Image => config.max_image_size_bytes,
            MediaKind::Document => config.max_document_size_bytes,
        };
        Self::new(
            kind,
            max,
            kind.allowed_content_types()
                .iter()
                .map(|ct| ct.to_string())
                .collect(),
        )
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = normalize_content_type(content_type);

        if self.allowed_content_types.iter().any(|ct| ct == &normalized) {
            return Ok(());
        }

        let content_type = content_type.to_string();
        Err(match self.kind {
            MediaKind::Image => ValidationError::ImageTypeInvalid { content_type },
            MediaKind::Document => ValidationError::DocumentTypeInvalid { content_type },
        })
    }

    /// Validate file size. The ceiling itself is allowed.
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size <= self.max_file_size {
            return Ok(());
        }

        let max = self.max_file_size;
        Err(match self.kind {
            MediaKind::Image => ValidationError::ImageSizeTooLarge { size, max },
            MediaKind::Document => ValidationError::DocumentSizeTooLarge { size, max },
        })
    }

    /// Type first, then size.
    pub fn check(&self, file: &CandidateFile) -> Result<(), ValidationError> {
        self.validate_content_type(&file.content_type)?;
        self.validate_file_size(file.size)?;
        Ok(())
    }

    pub fn validate(&self, file: &CandidateFile) -> ValidationResult {
        let result = self.check(file);
        if let Err(ref e) = result {
            tracing::debug!(
                error = %e,
                file_name = %file.name,
                kind = %self.kind,
                "File rejected by validator"
            );
        }
        result.into()
    }
}

/// Validate `file` for `kind` using the built-in limits.
pub fn validate(file: &CandidateFile, kind: MediaKind) -> ValidationResult {
    MediaValidator::for_kind(kind).validate(file)
}
