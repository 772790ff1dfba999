//! Preview generation for stored RAW files.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │              RawPreviewService              │
//! │  ┌──────────────┐  ┌─────────────────────┐  │
//! │  │ PreviewCache │  │  ThumbnailEncoder   │  │
//! │  │ (etag, w, h) │  │ (orient → fit → jpg)│  │
//! │  └──────────────┘  └─────────────────────┘  │
//! └──────────┬───────────────────┬──────────────┘
//!            │                   │
//!            ▼                   ▼
//!    ┌──────────────┐    ┌──────────────────┐
//!    │  FileStore   │    │ format::extract  │
//!    └──────────────┘    └──────────────────┘
//! ```
//!
//! "No preview available" is an outcome, not an error:
//! [`PreviewService::get_preview`] returns [`PreviewOutcome::NotFound`] when
//! the file is gone, the format is unsupported, or nothing decodable is
//! embedded.

mod cache;
mod encoder;
mod service;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::error::PreviewError;
use crate::store::StoredFile;

pub use cache::{PreviewCache, PreviewCacheKey, DEFAULT_PREVIEW_CACHE_CAPACITY};
pub use encoder::{
    apply_orientation, clamp_quality, fit_within, is_valid_quality, EncodedThumbnail,
    ThumbnailEncoder, DEFAULT_JPEG_QUALITY, MAX_JPEG_QUALITY, MIN_JPEG_QUALITY,
};
pub use service::RawPreviewService;

/// MIME type of every generated preview.
pub const PREVIEW_MIME_TYPE: &str = "image/jpeg";

// =============================================================================
// PreviewFile
// =============================================================================

/// A generated preview: a simple in-memory file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewFile {
    /// `<width>-<height>.jpg`
    pub name: String,

    pub mime_type: &'static str,

    #[serde(skip)]
    pub data: Bytes,

    /// Actual pixel width, at most the requested width
    pub width: u32,

    /// Actual pixel height, at most the requested height
    pub height: u32,
}

impl PreviewFile {
    /// Wrap encoded JPEG bytes.
    pub fn jpeg(data: Bytes, width: u32, height: u32) -> Self {
        Self {
            name: format!("{}-{}.jpg", width, height),
            mime_type: PREVIEW_MIME_TYPE,
            data,
            width,
            height,
        }
    }

    /// The encoded bytes.
    pub fn content(&self) -> &Bytes {
        &self.data
    }

    /// Encoded size in bytes.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<EncodedThumbnail> for PreviewFile {
    fn from(thumb: EncodedThumbnail) -> Self {
        Self::jpeg(thumb.data, thumb.width, thumb.height)
    }
}

// =============================================================================
// PreviewService Trait
// =============================================================================

/// Result of a preview request that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreviewOutcome {
    Generated(PreviewFile),
    /// No provider could produce a preview for this file
    NotFound,
}

impl PreviewOutcome {
    pub fn into_file(self) -> Option<PreviewFile> {
        match self {
            PreviewOutcome::Generated(file) => Some(file),
            PreviewOutcome::NotFound => None,
        }
    }
}

/// Produces thumbnails of stored files.
#[async_trait]
pub trait PreviewService: Send + Sync {
    /// Request a preview that fits within `width`x`height`.
    ///
    /// # Errors
    ///
    /// Only genuine failures are errors (invalid dimensions, storage faults,
    /// encoder failures). A missing preview is [`PreviewOutcome::NotFound`].
    async fn get_preview(
        &self,
        file: &StoredFile,
        width: u32,
        height: u32,
    ) -> Result<PreviewOutcome, PreviewError>;
}
