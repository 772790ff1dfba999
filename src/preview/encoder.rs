//! Thumbnail rendering.
//!
//! Turns a decoded source image into a JPEG thumbnail:
//!
//! - **Orientation**: the EXIF orientation of the RAW file is applied, so the
//!   thumbnail is upright.
//! - **Fit, never fill**: the image is shrunk to fit within the requested
//!   box with its aspect ratio preserved. Images that already fit are not
//!   upscaled.
//! - **Quality**: JPEG quality is fixed per encoder (default 80).

use std::io::Cursor;

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, ImageReader, ImageResult};

use crate::error::PreviewError;

/// Default JPEG quality (1-100).
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Minimum allowed JPEG quality.
pub const MIN_JPEG_QUALITY: u8 = 1;

/// Maximum allowed JPEG quality.
pub const MAX_JPEG_QUALITY: u8 = 100;

// =============================================================================
// Thumbnail Encoder
// =============================================================================

/// Decodes source images and encodes JPEG thumbnails.
#[derive(Debug, Clone)]
pub struct ThumbnailEncoder {
    quality: u8,
}

/// An encoded thumbnail and its pixel size.
#[derive(Debug, Clone)]
pub struct EncodedThumbnail {
    pub data: Bytes,
    pub width: u32,
    pub height: u32,
}

impl ThumbnailEncoder {
    /// Create an encoder at the default quality.
    pub fn new() -> Self {
        Self::with_quality(DEFAULT_JPEG_QUALITY)
    }

    /// Create an encoder; `quality` is clamped to 1-100.
    pub fn with_quality(quality: u8) -> Self {
        Self {
            quality: clamp_quality(quality),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Decode `source` as the given container format.
    pub fn decode(&self, source: &[u8], format: ImageFormat) -> ImageResult<DynamicImage> {
        ImageReader::with_format(Cursor::new(source), format).decode()
    }

    /// Orient, shrink to fit `width`x`height` and encode as JPEG.
    pub fn render(
        &self,
        image: DynamicImage,
        orientation: u16,
        width: u32,
        height: u32,
    ) -> Result<EncodedThumbnail, PreviewError> {
        let image = fit_within(apply_orientation(image, orientation), width, height);
        let rgb = image.to_rgb8();

        let mut output = Vec::new();
        JpegEncoder::new_with_quality(&mut output, self.quality)
            .encode_image(&rgb)
            .map_err(|e| PreviewError::Encode {
                message: e.to_string(),
            })?;

        Ok(EncodedThumbnail {
            data: Bytes::from(output),
            width: rgb.width(),
            height: rgb.height(),
        })
    }
}

impl Default for ThumbnailEncoder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Utility Functions
// =============================================================================

/// Apply an EXIF orientation (1-8); other values leave the image unchanged.
pub fn apply_orientation(image: DynamicImage, orientation: u16) -> DynamicImage {
    match orientation {
        2 => image.fliph(),
        3 => image.rotate180(),
        4 => image.flipv(),
        5 => image.rotate90().fliph(),
        6 => image.rotate90(),
        7 => image.rotate270().fliph(),
        8 => image.rotate270(),
        _ => image,
    }
}

/// Shrink `image` to fit within `width`x`height`, keeping its aspect ratio.
pub fn fit_within(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.width() <= width && image.height() <= height {
        return image;
    }
    image.thumbnail(width, height)
}

/// Returns `true` if quality is in the valid range (1-100).
#[inline]
pub fn is_valid_quality(quality: u8) -> bool {
    (MIN_JPEG_QUALITY..=MAX_JPEG_QUALITY).contains(&quality)
}

/// Clamp quality to the valid range.
#[inline]
pub fn clamp_quality(quality: u8) -> u8 {
    quality.clamp(MIN_JPEG_QUALITY, MAX_JPEG_QUALITY)
}

// =============================================================================
// Tests
// =============================================================================
