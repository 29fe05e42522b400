//! Pipeline limits and vocabularies.

/// Image upload ceiling (5 MiB, inclusive).
pub const MAX_IMAGE_SIZE_BYTES: u64 = 5 * 1024 * 1024;

/// Document upload ceiling (10 MiB, inclusive).
pub const MAX_DOCUMENT_SIZE_BYTES: u64 = 10 * 1024 * 1024;

pub const IMAGE_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

pub const DOCUMENT_CONTENT_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/gif",
    "application/pdf",
];

/// Images above this size are resized and re-encoded before upload.
pub const COMPRESS_THRESHOLD_BYTES: u64 = 300 * 1024;

/// Longest side after compression, in pixels.
pub const COMPRESS_MAX_DIMENSION: u32 = 1200;

/// JPEG quality used by the compressor (0-100).
pub const COMPRESS_JPEG_QUALITY: u8 = 82;

/// Extension used when none can be derived from the file name.
pub const DEFAULT_EXTENSION: &str = "jpg";

/// Id segment prefix for assets uploaded before their entity exists.
pub const UNASSIGNED_ID_PREFIX: &str = "unassigned-";

/// Advisory file-picker filter for photo slots. The validator is authoritative.
pub const PHOTO_ACCEPT: &str = "image/png,image/jpeg,image/webp";

/// Advisory file-picker filter for logo slots.
pub const LOGO_ACCEPT: &str = "image/png,image/jpeg,image/webp,image/gif";

/// Advisory file-picker filter for document slots.
pub const DOCUMENT_ACCEPT: &str = "image/png,image/jpeg,image/webp,image/gif,application/pdf";
