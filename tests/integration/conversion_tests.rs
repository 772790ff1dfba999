//! End-to-end conversion check tests.
//!
//! These run the full setup/execute/teardown cycle over synthetic RAW files
//! served by a mock fetcher, with an in-memory store.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use raw_preview_check::error::{CheckError, FixtureError, PreviewError, StoreError};
use raw_preview_check::fixture::{FixtureAsset, FixtureCache};
use raw_preview_check::harness::{AssetVerdict, CheckOptions, ConversionCheck};
use raw_preview_check::preview::{PreviewOutcome, PreviewService, RawPreviewService};
use raw_preview_check::store::{FileStore, Folder, MemoryFileStore, StoredFile};

use super::test_utils::{
    asset_for, create_3fr, create_cr2, create_dng, create_nef, create_nef_without_preview,
    create_raf, create_raster_tiff, create_test_jpeg, MockFetcher,
};

/// One synthetic sample per container family.
fn samples() -> Vec<(FixtureAsset, Vec<u8>)> {
    let files = vec![
        ("Фото\".NEF", create_nef(create_test_jpeg(320, 240), 1)),
        ("sample.DNG", create_dng(create_test_jpeg(200, 150))),
        ("sample.TIF", create_raster_tiff(64, 48)),
        ("sample.RAF", create_raf(create_test_jpeg(160, 120))),
        ("sample.CR2", create_cr2(create_test_jpeg(300, 200), 1)),
        ("sample.3FR", create_3fr(create_test_jpeg(120, 160))),
    ];
    files
        .into_iter()
        .map(|(name, data)| (asset_for(name, &data), data))
        .collect()
}

fn assets_of(samples: &[(FixtureAsset, Vec<u8>)]) -> Vec<FixtureAsset> {
    samples.iter().map(|(a, _)| a.clone()).collect()
}

async fn cache_with(
    dir: &std::path::Path,
    samples: &[(FixtureAsset, Vec<u8>)],
) -> FixtureCache<MockFetcher> {
    let cache = FixtureCache::new(dir, MockFetcher::serving(samples));
    cache.materialize(&assets_of(samples)).await.unwrap();
    cache
}

// =============================================================================
// Passing Runs
// =============================================================================

#[tokio::test]
async fn test_all_formats_pass_and_store_is_cleaned() {
    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples);
    let cache = cache_with(dir.path(), &samples).await;

    let store = Arc::new(MemoryFileStore::new());
    let previews = RawPreviewService::new(store.clone());

    let report = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
        .run()
        .await
        .unwrap();

    assert!(report.passed(), "failed: {:?}", report.failed().collect::<Vec<_>>());
    assert_eq!(report.assets.len(), 6);
    assert_eq!(report.user, "admin");
    assert!(store.is_empty().await);

    let names: Vec<_> = report.assets.iter().map(|a| a.file_name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Фото\".NEF",
            "sample.DNG",
            "sample.TIF",
            "sample.RAF",
            "sample.CR2",
            "sample.3FR"
        ]
    );

    for result in &report.assets {
        let AssetVerdict::Passed { preview } = &result.verdict else {
            panic!("{} did not pass", result.file_name);
        };
        assert!(preview.width <= 100 && preview.height <= 100);
    }
}

#[tokio::test]
async fn test_custom_dimensions_and_user() {
    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples[..1]);
    let cache = cache_with(dir.path(), &samples).await;

    let store = Arc::new(MemoryFileStore::new());
    let previews = RawPreviewService::new(store.clone());

    let report = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
        .with_options(CheckOptions {
            user: "alice".to_string(),
            width: 64,
            height: 64,
        })
        .run()
        .await
        .unwrap();

    assert_eq!(report.user, "alice");
    assert_eq!((report.width, report.height), (64, 64));
    let AssetVerdict::Passed { preview } = &report.assets[0].verdict else {
        panic!("expected a preview");
    };
    assert_eq!((preview.width, preview.height), (64, 48));
}

#[tokio::test]
async fn test_report_serializes_to_json() {
    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples[3..4]);
    let cache = cache_with(dir.path(), &samples).await;

    let store = Arc::new(MemoryFileStore::new());
    let previews = RawPreviewService::new(store.clone());
    let report = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
        .run()
        .await
        .unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["assets"][0]["file_name"], "sample.RAF");
    assert_eq!(json["assets"][0]["verdict"], "passed");
    assert_eq!(json["assets"][0]["preview"]["name"], "100-75.jpg");
}

// =============================================================================
// Failing Assets
// =============================================================================

#[tokio::test]
async fn test_missing_preview_does_not_stop_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let bare = create_nef_without_preview();
    let mut samples = vec![(asset_for("bare.NEF", &bare), bare)];
    samples.extend(samples_tail());
    let assets = assets_of(&samples);
    let cache = cache_with(dir.path(), &samples).await;

    let store = Arc::new(MemoryFileStore::new());
    let previews = RawPreviewService::new(store.clone());

    let report = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
        .run()
        .await
        .unwrap();

    assert!(!report.passed());
    assert_eq!(report.assets[0].verdict, AssetVerdict::PreviewMissing);
    assert!(report.assets[1].verdict.passed());
    assert_eq!(report.passed_count(), 1);
    assert!(store.is_empty().await);
}

fn samples_tail() -> Vec<(FixtureAsset, Vec<u8>)> {
    samples().split_off(5)
}

#[tokio::test]
async fn test_empty_preview_fails_asset() {
    struct EmptyPreviews;

    #[async_trait]
    impl PreviewService for EmptyPreviews {
        async fn get_preview(
            &self,
            _file: &StoredFile,
            width: u32,
            height: u32,
        ) -> Result<PreviewOutcome, PreviewError> {
            Ok(PreviewOutcome::Generated(
                raw_preview_check::PreviewFile::jpeg(Bytes::new(), width, height),
            ))
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples[..1]);
    let cache = cache_with(dir.path(), &samples).await;
    let store = MemoryFileStore::new();

    let report = ConversionCheck::new(&assets, &cache, &store, &EmptyPreviews)
        .run()
        .await
        .unwrap();

    assert_eq!(report.assets[0].verdict, AssetVerdict::EmptyPreview);
    assert!(!report.passed());
}

// =============================================================================
// Aborted Runs
// =============================================================================

#[tokio::test]
async fn test_missing_fixture_aborts_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples);

    // Only the first asset is cached
    let cache = cache_with(dir.path(), &samples[..1]).await;

    let store = Arc::new(MemoryFileStore::new());
    let previews = RawPreviewService::new(store.clone());

    let result = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
        .run()
        .await;

    assert!(matches!(
        result,
        Err(CheckError::Fixture(FixtureError::Missing { .. }))
    ));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_corrupt_cache_and_unreachable_source_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples[..1]);
    std::fs::write(dir.path().join(&assets[0].file_name), b"corrupted").unwrap();

    let cache = FixtureCache::new(dir.path(), MockFetcher::new());
    let outcomes = cache.materialize(&assets).await.unwrap();
    assert!(!outcomes[0].is_available());

    let store = Arc::new(MemoryFileStore::new());
    let previews = RawPreviewService::new(store.clone());
    let result = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
        .run()
        .await;

    assert!(matches!(
        result,
        Err(CheckError::Fixture(FixtureError::Missing { .. }))
    ));
}

#[tokio::test]
async fn test_preview_service_error_aborts() {
    struct FailingPreviews;

    #[async_trait]
    impl PreviewService for FailingPreviews {
        async fn get_preview(
            &self,
            _file: &StoredFile,
            _width: u32,
            _height: u32,
        ) -> Result<PreviewOutcome, PreviewError> {
            Err(PreviewError::Encode {
                message: "encoder crashed".to_string(),
            })
        }
    }

    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples);
    let cache = cache_with(dir.path(), &samples).await;
    let store = MemoryFileStore::new();

    let result = ConversionCheck::new(&assets, &cache, &store, &FailingPreviews)
        .run()
        .await;

    assert!(matches!(
        result,
        Err(CheckError::Preview(PreviewError::Encode { .. }))
    ));
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn test_name_collision_aborts() {
    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples[..1]);
    let cache = cache_with(dir.path(), &samples).await;

    let store = Arc::new(MemoryFileStore::new());
    let folder = store.user_folder("admin").await.unwrap();
    store
        .new_file(&folder, &assets[0].file_name, Bytes::from_static(b"existing"))
        .await
        .unwrap();
    let previews = RawPreviewService::new(store.clone());

    let result = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
        .run()
        .await;

    assert!(matches!(
        result,
        Err(CheckError::Store(StoreError::AlreadyExists { .. }))
    ));

    // The user's own file is not the check's to delete
    let existing = store.get(&folder, &assets[0].file_name).await.unwrap();
    assert_eq!(&store.read(&existing).await.unwrap()[..], b"existing");
}

#[tokio::test]
async fn test_collision_keeps_earlier_uploads_cleaned() {
    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples[..2]);
    let cache = cache_with(dir.path(), &samples).await;

    let store = Arc::new(MemoryFileStore::new());
    let folder = store.user_folder("admin").await.unwrap();
    store
        .new_file(&folder, &assets[1].file_name, Bytes::from_static(b"user data"))
        .await
        .unwrap();
    let previews = RawPreviewService::new(store.clone());

    let result = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
        .run()
        .await;

    assert!(result.is_err());
    assert_eq!(store.list(&folder).await, vec![assets[1].file_name.clone()]);
}

// =============================================================================
// Teardown
// =============================================================================

/// Store whose deletes always fail.
struct UndeletableStore(MemoryFileStore);

#[async_trait]
impl FileStore for UndeletableStore {
    async fn user_folder(&self, user: &str) -> Result<Folder, StoreError> {
        self.0.user_folder(user).await
    }

    async fn new_file(
        &self,
        folder: &Folder,
        name: &str,
        content: Bytes,
    ) -> Result<StoredFile, StoreError> {
        self.0.new_file(folder, name, content).await
    }

    async fn get(&self, folder: &Folder, name: &str) -> Result<StoredFile, StoreError> {
        self.0.get(folder, name).await
    }

    async fn read(&self, file: &StoredFile) -> Result<Bytes, StoreError> {
        self.0.read(file).await
    }

    async fn delete(&self, _folder: &Folder, _name: &str) -> Result<(), StoreError> {
        Err(StoreError::Io("permission denied".to_string()))
    }
}

#[tokio::test]
async fn test_teardown_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples[..2]);
    let cache = cache_with(dir.path(), &samples).await;

    let store = Arc::new(UndeletableStore(MemoryFileStore::new()));
    let previews = RawPreviewService::new(store.clone());

    let report = ConversionCheck::new(&assets, &cache, store.as_ref(), &previews)
        .run()
        .await
        .unwrap();

    assert!(report.assets.iter().all(|a| a.verdict.passed()));
    assert_eq!(report.teardown_failures.len(), 2);
    assert!(report.teardown_failures[0].message.contains("permission denied"));
    assert!(!report.passed());
}

#[tokio::test]
async fn test_teardown_only_touches_uploaded_files() {
    let store = MemoryFileStore::new();
    let dir = tempfile::tempdir().unwrap();
    let samples = samples();
    let assets = assets_of(&samples);
    let cache = FixtureCache::new(dir.path(), MockFetcher::new());
    let previews = RawPreviewService::new(Arc::new(MemoryFileStore::new()));

    let check = ConversionCheck::new(&assets, &cache, &store, &previews);
    let folder = check.setup().await.unwrap();
    store
        .new_file(&folder, &assets[0].file_name, Bytes::from_static(b"user data"))
        .await
        .unwrap();
    let uploaded = store
        .new_file(&folder, "uploaded.NEF", Bytes::from_static(b"fixture"))
        .await
        .unwrap();

    let failures = check.teardown(&folder, &[uploaded]).await;

    assert!(failures.is_empty());
    assert_eq!(store.list(&folder).await, vec![assets[0].file_name.clone()]);
}

#[tokio::test]
async fn test_teardown_ignores_already_removed_file() {
    let store = MemoryFileStore::new();
    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::new(dir.path(), MockFetcher::new());
    let previews = RawPreviewService::new(Arc::new(MemoryFileStore::new()));

    let check = ConversionCheck::new(&[], &cache, &store, &previews);
    let folder = check.setup().await.unwrap();
    let gone = StoredFile::describe(&folder, "gone.NEF", b"fixture");

    assert!(check.teardown(&folder, &[gone]).await.is_empty());
}
