//! # raw-preview-check
//!
//! Verifies that camera RAW files (NEF, CR2, DNG, TIF, RAF, 3FR) produce
//! thumbnails once stored.
//!
//! A fixed list of RAW samples is downloaded into a local cache and verified
//! by digest. Each sample is then uploaded into a user's folder in a file
//! store, a thumbnail is requested from the preview service, and the sample
//! is deleted again.
//!
//! ## Architecture
//!
//! - [`fixture`] - Fixture list, manifest loading and the digest-verified cache
//! - [`store`] - File store trait with in-memory and on-disk implementations
//! - [`io`] - Range reads over file content
//! - [`mod@format`] - TIFF/RAF container parsing and embedded preview discovery
//! - [`preview`] - Preview service, thumbnail encoder and preview cache
//! - [`harness`] - The conversion check: setup, execute, teardown
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use raw_preview_check::{
//!     default_assets, ConversionCheck, FixtureCache, MemoryFileStore, RawPreviewService,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let assets = default_assets();
//!     let cache = FixtureCache::with_http(std::env::temp_dir())?;
//!     cache.materialize(&assets).await?;
//!
//!     let store = Arc::new(MemoryFileStore::new());
//!     let previews = RawPreviewService::new(store.clone());
//!
//!     let report = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
//!         .run()
//!         .await?;
//!     assert!(report.passed());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod fixture;
pub mod format;
pub mod harness;
pub mod io;
pub mod preview;
pub mod store;

// Re-export commonly used types
pub use config::{CheckConfig, Cli, Command, FetchConfig, ListConfig, OutputFormat};
pub use error::{
    CheckError, FetchError, FixtureError, FormatError, IoError, PreviewError, StoreError,
    TiffError,
};
pub use fixture::{
    default_assets, load_manifest, CacheOutcome, CacheStatus, DigestAlgorithm, Fetcher,
    FixtureAsset, FixtureCache, HttpFetcher,
};
pub use format::{detect_format, extract_preview, RawFormat};
pub use harness::{AssetVerdict, CheckOptions, CheckReport, ConversionCheck};
pub use io::{MemoryReader, RangeReader};
pub use preview::{
    PreviewFile, PreviewOutcome, PreviewService, RawPreviewService, ThumbnailEncoder,
};
pub use store::{FileStore, Folder, LocalFileStore, MemoryFileStore, StoredFile};
