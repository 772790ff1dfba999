//! Checks against the real RAW samples.
//!
//! These tests download several hundred megabytes and are ignored by default.
//!
//! ```bash
//! cargo test --test integration real_fixture -- --ignored
//! ```
//!
//! Set `RAWPREVIEW_CACHE_DIR` to reuse an existing fixture cache.

use std::path::PathBuf;
use std::sync::Arc;

use raw_preview_check::fixture::{default_assets, FixtureCache};
use raw_preview_check::harness::ConversionCheck;
use raw_preview_check::preview::RawPreviewService;
use raw_preview_check::store::MemoryFileStore;

fn cache_dir() -> (Option<tempfile::TempDir>, PathBuf) {
    match std::env::var_os("RAWPREVIEW_CACHE_DIR") {
        Some(dir) => (None, PathBuf::from(dir)),
        None => {
            let tmp = tempfile::tempdir().unwrap();
            let path = tmp.path().to_path_buf();
            (Some(tmp), path)
        }
    }
}

#[tokio::test]
#[ignore = "downloads the real RAW samples"]
async fn test_real_fixture_download() {
    let (_guard, dir) = cache_dir();
    let assets = default_assets();
    let cache = FixtureCache::with_http(dir).unwrap();

    let outcomes = cache.materialize(&assets).await.unwrap();
    for (asset, outcome) in assets.iter().zip(&outcomes) {
        assert!(outcome.is_available(), "{}: {:?}", asset.file_name, outcome);
    }
}

#[tokio::test]
#[ignore = "downloads the real RAW samples"]
async fn test_real_fixture_previews() {
    let (_guard, dir) = cache_dir();
    let assets = default_assets();
    let cache = FixtureCache::with_http(dir).unwrap();
    cache.materialize(&assets).await.unwrap();

    let store = Arc::new(MemoryFileStore::new());
    let previews = RawPreviewService::new(store.clone());
    let report = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
        .run()
        .await
        .unwrap();

    for result in report.failed() {
        eprintln!("{}: {}", result.file_name, result.verdict.label());
    }
    assert!(report.passed());
    assert!(store.is_empty().await);
}
