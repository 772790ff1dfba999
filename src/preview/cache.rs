//! Cache of generated previews.
//!
//! Previews are keyed by the content etag of the source file and the
//! requested bounding box, so re-uploading identical bytes under another name
//! still hits. The cache tracks the total encoded size and evicts
//! least-recently-used entries once the byte capacity is exceeded.

use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tokio::sync::RwLock;

use super::PreviewFile;

/// Default cache capacity: 16MB
pub const DEFAULT_PREVIEW_CACHE_CAPACITY: usize = 16 * 1024 * 1024;

/// Default maximum number of entries (to bound LRU overhead)
const DEFAULT_MAX_ENTRIES: usize = 1_024;

// =============================================================================
// Cache Key
// =============================================================================

/// Cache key for generated previews.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreviewCacheKey {
    /// Content etag of the source file
    pub etag: Arc<str>,

    /// Requested bounding box width
    pub width: u32,

    /// Requested bounding box height
    pub height: u32,
}

impl PreviewCacheKey {
    pub fn new(etag: impl Into<Arc<str>>, width: u32, height: u32) -> Self {
        Self {
            etag: etag.into(),
            width,
            height,
        }
    }
}

// =============================================================================
// Preview Cache
// =============================================================================

/// LRU cache of encoded previews with size-based capacity.
///
/// Thread-safe; share it across tasks via `Arc` if needed.
pub struct PreviewCache {
    cache: RwLock<LruCache<PreviewCacheKey, PreviewFile>>,

    /// Maximum total encoded size in bytes
    max_size: usize,

    /// Current total encoded size in bytes
    current_size: RwLock<usize>,
}

impl PreviewCache {
    /// Create a cache with the default capacity (16MB).
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_PREVIEW_CACHE_CAPACITY)
    }

    /// Create a cache holding at most `max_size` bytes of previews.
    pub fn with_capacity(max_size: usize) -> Self {
        Self::with_capacity_and_entries(max_size, DEFAULT_MAX_ENTRIES)
    }

    /// Create a cache with a byte capacity and an entry limit.
    pub fn with_capacity_and_entries(max_size: usize, max_entries: usize) -> Self {
        let entries = NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: RwLock::new(LruCache::new(entries)),
            max_size,
            current_size: RwLock::new(0),
        }
    }

    /// Get a preview, marking it as recently used.
    pub async fn get(&self, key: &PreviewCacheKey) -> Option<PreviewFile> {
        let mut cache = self.cache.write().await;
        cache.get(key).cloned()
    }

    /// Check for a preview without updating LRU order.
    pub async fn contains(&self, key: &PreviewCacheKey) -> bool {
        let cache = self.cache.read().await;
        cache.contains(key)
    }

    /// Store a preview, evicting LRU entries while over capacity.
    ///
    /// A preview larger than the whole capacity is not cached.
    pub async fn put(&self, key: PreviewCacheKey, preview: PreviewFile) {
        let preview_size = preview.size();
        if preview_size > self.max_size {
            return;
        }

        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;

        // Returns the replaced value, or the entry evicted by the entry limit
        if let Some((_, evicted)) = cache.push(key, preview) {
            *current_size = current_size.saturating_sub(evicted.size());
        }
        *current_size += preview_size;

        while *current_size > self.max_size {
            match cache.pop_lru() {
                Some((_, evicted)) => {
                    *current_size = current_size.saturating_sub(evicted.size());
                }
                None => break,
            }
        }
    }

    pub async fn clear(&self) {
        let mut cache = self.cache.write().await;
        let mut current_size = self.current_size.write().await;
        cache.clear();
        *current_size = 0;
    }

    /// Number of cached previews.
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// Total encoded size of cached previews in bytes.
    pub async fn size(&self) -> usize {
        *self.current_size.read().await
    }

    /// Maximum capacity in bytes.
    pub fn capacity(&self) -> usize {
        self.max_size
    }
}

impl Default for PreviewCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
