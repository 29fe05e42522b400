//! Best-effort image compression before upload.
//!
//! Large photos are downscaled so neither side exceeds the configured bound
//! and re-encoded as JPEG. Compression is an optimisation only: any failure
//! hands back the original file untouched.

use async_trait::async_trait;
use estate_core::{CandidateFile, CompressionSettings};

#[cfg(feature = "image")]
use bytes::Bytes;
#[cfg(feature = "image")]
use image::{imageops::FilterType, DynamicImage, GenericImageView};
#[cfg(feature = "image")]
use std::io::Cursor;

/// Output type of a compressed image.
pub const COMPRESSED_CONTENT_TYPE: &str = "image/jpeg";
const COMPRESSED_EXTENSION: &str = "jpg";

#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[cfg(feature = "image")]
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[cfg(feature = "image")]
    #[error("Failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("Compression task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Transforms a file before upload.
///
/// Implementations never fail: when they cannot improve a file they return it
/// as given.
#[async_trait]
pub trait Compressor: Send + Sync {
    async fn maybe_compress(&self, file: CandidateFile) -> CandidateFile;
}

/// Pass-through for environments without image codecs.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCompressor;

#[async_trait]
impl Compressor for NoopCompressor {
    async fn maybe_compress(&self, file: CandidateFile) -> CandidateFile {
        file
    }
}

/// Dimensions that fit `width`x`height` inside a `max`x`max` box, keeping the
/// aspect ratio. Never scales up.
pub fn target_dimensions(width: u32, height: u32, max: u32) -> (u32, u32) {
    if width <= max && height <= max {
        return (width, height);
    }

    let scale = max as f64 / width.max(height) as f64;
    let scaled = |side: u32| ((side as f64 * scale).round() as u32).clamp(1, max);
    (scaled(width), scaled(height))
}

/// `{stem}.jpg` for the re-encoded output.
pub fn compressed_file_name(original: &str) -> String {
    let stem = original.rsplit_once('.').map_or(original, |(stem, _)| stem);
    let stem = if stem.trim_matches('.').is_empty() {
        "image"
    } else {
        stem
    };
    format!("{}.{}", stem, COMPRESSED_EXTENSION)
}

/// Compressor backed by the `image` crate.
#[cfg(feature = "image")]
#[derive(Debug, Clone, Default)]
pub struct ImageCompressor {
    settings: CompressionSettings,
}

#[cfg(feature = "image")]
impl ImageCompressor {
    pub fn new(settings: CompressionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> CompressionSettings {
        self.settings
    }

    /// Only accepted image types above the size threshold are touched.
    pub fn should_compress(&self, file: &CandidateFile) -> bool {
        file.is_image() && file.size > self.settings.threshold_bytes
    }

    /// Decode, downscale and re-encode synchronously. Callers on an async
    /// runtime go through [`Compressor::maybe_compress`], which moves this
    /// onto the blocking pool.
    pub fn compress_blocking(&self, file: &CandidateFile) -> Result<CandidateFile, CompressionError> {
        let img = image::ImageReader::new(Cursor::new(file.data.as_ref()))
            .with_guessed_format()
            .map_err(|e| CompressionError::Decode(image::ImageError::IoError(e)))?
            .decode()
            .map_err(CompressionError::Decode)?;

        let (width, height) = img.dimensions();
        let (target_width, target_height) =
            target_dimensions(width, height, self.settings.max_dimension);

        let resized = if (target_width, target_height) == (width, height) {
            img
        } else {
            img.resize_exact(target_width, target_height, FilterType::Triangle)
        };

        // JPEG has no alpha channel.
        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());

        let mut buffer = Vec::with_capacity((target_width * target_height) as usize / 4);
        let encoder =
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buffer, self.settings.jpeg_quality);
        rgb.write_with_encoder(encoder)
            .map_err(CompressionError::Encode)?;

        tracing::debug!(
            file_name = %file.name,
            original_width = width,
            original_height = height,
            width = target_width,
            height = target_height,
            original_size = file.size,
            compressed_size = buffer.len(),
            "Image compressed"
        );

        Ok(CandidateFile::new(
            compressed_file_name(&file.name),
            COMPRESSED_CONTENT_TYPE,
            Bytes::from(buffer),
        ))
    }
}

#[cfg(feature = "image")]
#[async_trait]
impl Compressor for ImageCompressor {
    async fn maybe_compress(&self, file: CandidateFile) -> CandidateFile {
        if !self.should_compress(&file) {
            return file;
        }

        let compressor = self.clone();
        let input = file.clone();
        // Image decode is CPU-bound; run off the async pool to avoid blocking other tasks.
        let result = tokio::task::spawn_blocking(move || compressor.compress_blocking(&input))
            .await
            .map_err(CompressionError::from)
            .and_then(|r| r);

        match result {
            Ok(compressed) => compressed,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    file_name = %file.name,
                    size_bytes = file.size,
                    "Image compression failed, uploading original"
                );
                file
            }
        }
    }
}
