//! Fixture-verified conversion check.
//!
//! For each fixture: upload the cached bytes into a user's folder, request a
//! thumbnail, judge the result, and finally delete every uploaded file.
//!
//! # Failure semantics
//!
//! - A "not found" preview or an empty preview fails that asset's verdict
//!   but does not stop the loop.
//! - Any error (fixture missing from the cache, storage fault, preview
//!   service failure) aborts the run.
//! - Teardown always runs and deletes only files this run created, so a
//!   pre-existing file with a fixture's name is left alone. Cleanup failures
//!   are logged and reported.

mod report;

use tracing::{debug, info, warn};

use crate::error::CheckError;
use crate::fixture::{Fetcher, FixtureAsset, FixtureCache};
use crate::preview::{PreviewOutcome, PreviewService};
use crate::store::{FileStore, Folder, StoredFile};

pub use report::{AssetResult, AssetVerdict, CheckReport, TeardownFailure};

/// Default user whose folder receives the fixtures.
pub const DEFAULT_USER: &str = "admin";

/// Default thumbnail bounding box.
pub const DEFAULT_PREVIEW_SIZE: u32 = 100;

/// Parameters of a check run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckOptions {
    pub user: String,
    pub width: u32,
    pub height: u32,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            user: DEFAULT_USER.to_string(),
            width: DEFAULT_PREVIEW_SIZE,
            height: DEFAULT_PREVIEW_SIZE,
        }
    }
}

// =============================================================================
// ConversionCheck
// =============================================================================

/// Uploads fixtures, requests previews and cleans up.
pub struct ConversionCheck<'a, F: Fetcher, S: FileStore, P: PreviewService> {
    assets: &'a [FixtureAsset],
    fixtures: &'a FixtureCache<F>,
    store: &'a S,
    previews: &'a P,
    options: CheckOptions,
}

impl<'a, F: Fetcher, S: FileStore, P: PreviewService> ConversionCheck<'a, F, S, P> {
    pub fn new(
        assets: &'a [FixtureAsset],
        fixtures: &'a FixtureCache<F>,
        store: &'a S,
        previews: &'a P,
    ) -> Self {
        Self {
            assets,
            fixtures,
            store,
            previews,
            options: CheckOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CheckOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &CheckOptions {
        &self.options
    }

    /// Run setup, execution and teardown.
    ///
    /// Teardown runs even when execution returns an error, and removes only
    /// the files this run created.
    pub async fn run(&self) -> Result<CheckReport, CheckError> {
        let folder = self.setup().await?;
        let mut uploaded = Vec::with_capacity(self.assets.len());
        let executed = self.execute(&folder, &mut uploaded).await;
        let teardown_failures = self.teardown(&folder, &uploaded).await;

        let assets = executed?;
        Ok(CheckReport {
            user: self.options.user.clone(),
            width: self.options.width,
            height: self.options.height,
            assets,
            teardown_failures,
        })
    }

    /// Resolve the user's root folder.
    pub async fn setup(&self) -> Result<Folder, CheckError> {
        let folder = self.store.user_folder(&self.options.user).await?;
        debug!(user = %folder.owner, "Check setup complete");
        Ok(folder)
    }

    /// Check every asset in order.
    ///
    /// Every file created in the store is appended to `uploaded`, also when
    /// a later step fails.
    pub async fn execute(
        &self,
        folder: &Folder,
        uploaded: &mut Vec<StoredFile>,
    ) -> Result<Vec<AssetResult>, CheckError> {
        let mut results = Vec::with_capacity(self.assets.len());
        for asset in self.assets {
            let verdict = self.check_asset(folder, asset, uploaded).await?;
            if verdict.passed() {
                info!(file = %asset.file_name, "Preview generated");
            } else {
                warn!(file = %asset.file_name, verdict = verdict.label(), "Preview check failed");
            }
            results.push(AssetResult {
                file_name: asset.file_name.clone(),
                verdict,
            });
        }
        Ok(results)
    }

    /// Upload one asset and judge its preview.
    pub async fn check_asset(
        &self,
        folder: &Folder,
        asset: &FixtureAsset,
        uploaded: &mut Vec<StoredFile>,
    ) -> Result<AssetVerdict, CheckError> {
        let content = self.fixtures.read(asset).await?;
        let file = self
            .store
            .new_file(folder, &asset.file_name, content)
            .await?;
        uploaded.push(file.clone());

        let outcome = self
            .previews
            .get_preview(&file, self.options.width, self.options.height)
            .await?;

        Ok(match outcome {
            PreviewOutcome::Generated(preview) if preview.is_empty() => AssetVerdict::EmptyPreview,
            PreviewOutcome::Generated(preview) => AssetVerdict::Passed { preview },
            PreviewOutcome::NotFound => AssetVerdict::PreviewMissing,
        })
    }

    /// Delete the files this run uploaded.
    pub async fn teardown(
        &self,
        folder: &Folder,
        uploaded: &[StoredFile],
    ) -> Vec<TeardownFailure> {
        let mut failures = Vec::new();
        for file in uploaded {
            match self.store.delete(folder, &file.name).await {
                Ok(()) => debug!(file = %file.name, "Removed uploaded fixture"),
                Err(e) if e.is_not_found() => {
                    debug!(file = %file.name, "Uploaded fixture already gone")
                }
                Err(e) => {
                    warn!(file = %file.name, error = %e, "Failed to remove uploaded fixture");
                    failures.push(TeardownFailure {
                        file_name: file.name.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }
        failures
    }
}
