//! Estate Processing Library
//!
//! File validation and pre-upload image compression.

pub mod compression;
pub mod validator;

#[cfg(feature = "image")]
pub use compression::ImageCompressor;
pub use compression::{
    compressed_file_name, target_dimensions, CompressionError, Compressor, NoopCompressor,
};
pub use validator::{validate, MediaValidator, ValidationError, ValidationResult};
