//! Remote RAW samples, cached locally and verified by digest.
//!
//! # Components
//!
//! - [`FixtureAsset`]: source URL, file name and expected digest of a sample
//! - [`default_assets`]: the built-in sample list
//! - [`load_manifest`]: load a sample list from JSON
//! - [`Fetcher`] / [`HttpFetcher`]: where the bytes come from
//! - [`FixtureCache`]: makes assets available at deterministic local paths
//!
//! # Example
//!
//! ```ignore
//! use raw_preview_check::fixture::{default_assets, FixtureCache};
//!
//! let cache = FixtureCache::with_http(std::env::temp_dir())?;
//! let outcomes = cache.materialize(&default_assets()).await?;
//! ```

mod asset;
mod cache;
pub mod digest;
mod fetch;

pub use asset::{default_assets, encode_source_url, load_manifest, parse_manifest, FixtureAsset};
pub use cache::{default_cache_dir, CacheOutcome, CacheStatus, FixtureCache};
pub use digest::DigestAlgorithm;
pub use fetch::{Fetcher, HttpFetcher, DEFAULT_FETCH_TIMEOUT};
