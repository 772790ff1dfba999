//! Preview service for camera RAW files.
//!
//! # Pipeline
//!
//! 1. Validate the requested box
//! 2. Check the preview cache (content etag + box)
//! 3. Read the file from the store
//! 4. Detect the RAW container
//! 5. Locate the largest decodable embedded JPEG; a plain TIFF without one is
//!    decoded as a raster instead
//! 6. Orient, shrink and encode
//! 7. Cache and return

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, ImageFormat};
use tracing::{debug, warn};

use crate::error::PreviewError;
use crate::format::preview::ORIENTATION_NORMAL;
use crate::format::{detect_format, extract_preview, RawFormat};
use crate::io::MemoryReader;
use crate::store::{FileStore, StoredFile};

use super::cache::{PreviewCache, PreviewCacheKey};
use super::encoder::ThumbnailEncoder;
use super::{PreviewFile, PreviewOutcome, PreviewService};

/// Image bytes picked as the preview source.
struct PreviewSource {
    data: Bytes,
    format: ImageFormat,
    orientation: u16,
}

// =============================================================================
// RawPreviewService
// =============================================================================

/// [`PreviewService`] for RAW files held in a [`FileStore`].
///
/// # Example
///
/// ```ignore
/// use raw_preview_check::preview::{PreviewService, RawPreviewService};
/// use raw_preview_check::store::MemoryFileStore;
///
/// let store = Arc::new(MemoryFileStore::new());
/// let previews = RawPreviewService::new(store.clone());
///
/// let folder = store.user_folder("admin").await?;
/// let file = store.new_file(&folder, "x.NEF", bytes).await?;
/// let outcome = previews.get_preview(&file, 100, 100).await?;
/// ```
pub struct RawPreviewService<S: FileStore> {
    store: Arc<S>,
    cache: PreviewCache,
    encoder: ThumbnailEncoder,
}

impl<S: FileStore> RawPreviewService<S> {
    /// Create a service with the default cache and JPEG quality.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            cache: PreviewCache::new(),
            encoder: ThumbnailEncoder::new(),
        }
    }

    /// Create a service with a custom cache and JPEG quality.
    pub fn with_options(store: Arc<S>, cache_capacity: usize, jpeg_quality: u8) -> Self {
        Self {
            store,
            cache: PreviewCache::with_capacity(cache_capacity),
            encoder: ThumbnailEncoder::with_quality(jpeg_quality),
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn cache(&self) -> &PreviewCache {
        &self.cache
    }

    /// Pick the bytes to decode, `None` if the file offers nothing usable.
    async fn locate_source(&self, file: &StoredFile, content: Bytes) -> Option<PreviewSource> {
        let reader = MemoryReader::new(content, format!("{}/{}", file.owner, file.name));

        let format = match detect_format(&reader).await {
            Ok(format) => format,
            Err(e) => {
                debug!(file = %file.name, error = %e, "No RAW container detected");
                return None;
            }
        };

        match extract_preview(&reader, format).await {
            Ok(Some(preview)) => {
                return Some(PreviewSource {
                    data: preview.data,
                    format: ImageFormat::Jpeg,
                    orientation: preview.orientation,
                })
            }
            Ok(None) => debug!(file = %file.name, format = format.name(), "No embedded JPEG"),
            Err(e) => {
                warn!(
                    file = %file.name,
                    format = format.name(),
                    error = %e,
                    "Failed to scan for embedded previews"
                )
            }
        }

        (format == RawFormat::Tiff).then(|| PreviewSource {
            data: reader.bytes().clone(),
            format: ImageFormat::Tiff,
            orientation: ORIENTATION_NORMAL,
        })
    }

    fn decode(&self, file: &StoredFile, source: &PreviewSource) -> Option<DynamicImage> {
        match self.encoder.decode(&source.data, source.format) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!(
                    file = %file.name,
                    format = ?source.format,
                    error = %e,
                    "Failed to decode preview source"
                );
                None
            }
        }
    }
}

#[async_trait]
impl<S: FileStore> PreviewService for RawPreviewService<S> {
    async fn get_preview(
        &self,
        file: &StoredFile,
        width: u32,
        height: u32,
    ) -> Result<PreviewOutcome, PreviewError> {
        if width == 0 || height == 0 {
            return Err(PreviewError::InvalidDimensions { width, height });
        }

        let cache_key = PreviewCacheKey::new(file.etag.as_str(), width, height);
        if let Some(cached) = self.cache.get(&cache_key).await {
            debug!(file = %file.name, width, height, "Preview cache hit");
            return Ok(PreviewOutcome::Generated(cached));
        }

        let content = match self.store.read(file).await {
            Ok(content) => content,
            Err(e) if e.is_not_found() => {
                debug!(file = %file.name, "Source file not found in store");
                return Ok(PreviewOutcome::NotFound);
            }
            Err(e) => return Err(e.into()),
        };

        let Some(source) = self.locate_source(file, content).await else {
            return Ok(PreviewOutcome::NotFound);
        };
        let Some(image) = self.decode(file, &source) else {
            return Ok(PreviewOutcome::NotFound);
        };

        let preview: PreviewFile = self
            .encoder
            .render(image, source.orientation, width, height)?
            .into();
        self.cache.put(cache_key, preview.clone()).await;

        debug!(file = %file.name, width, height, "Generated preview");
        Ok(PreviewOutcome::Generated(preview))
    }
}
