//! Local, digest-verified cache of fixture files.
//!
//! # Algorithm
//!
//! For each asset, the cache path is `<dir>/<file_name>`:
//!
//! 1. If the file exists and hashes to the expected digest, it is used as is
//!    and nothing is fetched.
//! 2. Otherwise any stale file is removed and the asset is fetched once.
//! 3. Fetched bytes are written only if they hash to the expected digest.
//!    The write goes to a temporary sibling which is then renamed into place.
//!
//! A failed fetch or a digest mismatch leaves the asset unavailable without
//! failing the step; the gap surfaces later as [`FixtureError::Missing`] when
//! the fixture is read.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use serde::Serialize;
use tokio::fs;
use tracing::{debug, info, warn};

use super::asset::FixtureAsset;
use super::fetch::{Fetcher, HttpFetcher};
use crate::error::{FetchError, FixtureError};

/// Default cache directory: the system temp directory.
pub fn default_cache_dir() -> PathBuf {
    std::env::temp_dir()
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of materializing one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CacheOutcome {
    /// A valid copy was already cached
    Hit,
    /// Fetched, verified and written
    Downloaded { bytes: u64 },
    /// Left unresolved: fetch failed or content did not verify
    Unavailable { reason: String },
}

impl CacheOutcome {
    pub fn is_available(&self) -> bool {
        !matches!(self, CacheOutcome::Unavailable { .. })
    }
}

/// State of an asset in the cache, without touching the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Valid,
    /// A file exists but its digest does not match
    Corrupt,
    Absent,
}

// =============================================================================
// FixtureCache
// =============================================================================

/// Digest-verified fixture cache over a [`Fetcher`].
pub struct FixtureCache<F: Fetcher> {
    dir: PathBuf,
    fetcher: F,
}

impl FixtureCache<HttpFetcher> {
    /// Cache in `dir` that downloads over HTTP.
    pub fn with_http(dir: impl Into<PathBuf>) -> Result<Self, FetchError> {
        Ok(Self::new(dir, HttpFetcher::new()?))
    }
}

impl<F: Fetcher> FixtureCache<F> {
    pub fn new(dir: impl Into<PathBuf>, fetcher: F) -> Self {
        Self {
            dir: dir.into(),
            fetcher,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Deterministic local path of an asset.
    pub fn path_for(&self, asset: &FixtureAsset) -> PathBuf {
        self.dir.join(&asset.file_name)
    }

    /// Make every asset available locally, one outcome per asset in order.
    ///
    /// # Errors
    ///
    /// Only local filesystem faults are errors: the cache directory cannot be
    /// created, or a stale file cannot be removed, or verified bytes cannot be
    /// written. Network failures and digest mismatches are outcomes.
    pub async fn materialize(
        &self,
        assets: &[FixtureAsset],
    ) -> Result<Vec<CacheOutcome>, FixtureError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| FixtureError::CacheDir {
                path: self.dir.display().to_string(),
                message: e.to_string(),
            })?;

        let mut outcomes = Vec::with_capacity(assets.len());
        for asset in assets {
            let outcome = self.materialize_one(asset).await?;
            if let CacheOutcome::Unavailable { reason } = &outcome {
                warn!(
                    file = %asset.file_name,
                    url = %asset.source_url,
                    reason = %reason,
                    "Fixture unavailable"
                );
            }
            outcomes.push(outcome);
        }
        Ok(outcomes)
    }

    async fn materialize_one(&self, asset: &FixtureAsset) -> Result<CacheOutcome, FixtureError> {
        let path = self.path_for(asset);

        match self.status(asset).await? {
            CacheStatus::Valid => {
                debug!(path = %path.display(), "Fixture cache hit");
                return Ok(CacheOutcome::Hit);
            }
            CacheStatus::Corrupt => {
                debug!(path = %path.display(), "Removing cached fixture with wrong digest");
                remove_file(&path).await?;
            }
            CacheStatus::Absent => {}
        }

        let url = asset.fetch_url();
        let data = match self.fetcher.fetch(&url).await {
            Ok(data) => data,
            Err(e) => {
                return Ok(CacheOutcome::Unavailable {
                    reason: e.to_string(),
                })
            }
        };

        let actual = asset.algorithm.hex_digest(&data);
        if actual != asset.expected_digest {
            return Ok(CacheOutcome::Unavailable {
                reason: format!(
                    "{} mismatch: expected {}, got {}",
                    asset.algorithm.name(),
                    asset.expected_digest,
                    actual
                ),
            });
        }

        self.write_atomically(&path, &data).await?;
        info!(path = %path.display(), bytes = data.len(), "Downloaded fixture");
        Ok(CacheOutcome::Downloaded {
            bytes: data.len() as u64,
        })
    }

    /// Inspect the cached copy of an asset.
    pub async fn status(&self, asset: &FixtureAsset) -> Result<CacheStatus, FixtureError> {
        let path = self.path_for(asset);
        match fs::read(&path).await {
            Ok(data) if asset.matches(&data) => Ok(CacheStatus::Valid),
            Ok(_) => Ok(CacheStatus::Corrupt),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(CacheStatus::Absent),
            Err(e) => Err(FixtureError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    /// Read the cached bytes of an asset.
    ///
    /// Returns [`FixtureError::Missing`] when the file is not in the cache.
    pub async fn read(&self, asset: &FixtureAsset) -> Result<Bytes, FixtureError> {
        let path = self.path_for(asset);
        match fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(FixtureError::Missing {
                path: path.display().to_string(),
            }),
            Err(e) => Err(FixtureError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            }),
        }
    }

    async fn write_atomically(&self, path: &Path, data: &[u8]) -> Result<(), FixtureError> {
        let write_err = |e: std::io::Error| FixtureError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        };

        let mut tmp_name = std::ffi::OsString::from(".");
        tmp_name.push(path.file_name().unwrap_or_default());
        tmp_name.push(".part");
        let tmp = path.with_file_name(tmp_name);

        fs::write(&tmp, data).await.map_err(write_err)?;
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(write_err(e));
        }
        Ok(())
    }
}

async fn remove_file(path: &Path) -> Result<(), FixtureError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(FixtureError::Remove {
            path: path.display().to_string(),
            message: e.to_string(),
        }),
    }
}
