//! HTTP fetcher tests against a local axum server.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::routing::get;
use axum::Router;
use tokio::sync::Mutex;

use raw_preview_check::error::FetchError;
use raw_preview_check::fixture::{CacheOutcome, Fetcher, FixtureAsset, FixtureCache, HttpFetcher};

use super::test_utils::{create_raf, create_test_jpeg};

/// Bodies by raw (still encoded) request path, plus every path requested.
#[derive(Clone, Default)]
struct ServerState {
    bodies: Arc<HashMap<String, Vec<u8>>>,
    seen: Arc<Mutex<Vec<String>>>,
}

async fn serve_fixture(State(state): State<ServerState>, uri: Uri) -> (StatusCode, Vec<u8>) {
    let path = uri.path().to_string();
    state.seen.lock().await.push(path.clone());
    match state.bodies.get(&path) {
        Some(body) => (StatusCode::OK, body.clone()),
        None => (StatusCode::NOT_FOUND, Vec::new()),
    }
}

/// Start a server on an ephemeral port and return its base URL.
async fn start_server(state: ServerState) -> String {
    let app = Router::new()
        .route("/data/{*path}", get(serve_fixture))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn state_with(path: &str, body: Vec<u8>) -> ServerState {
    ServerState {
        bodies: Arc::new(HashMap::from([(path.to_string(), body)])),
        seen: Arc::default(),
    }
}

#[tokio::test]
async fn test_download_with_space_in_url() {
    let raf = create_raf(create_test_jpeg(32, 32));
    let state = state_with("/data/Fujifilm/X%20A1/DSCF.RAF", raf.clone());
    let base = start_server(state.clone()).await;

    let asset = FixtureAsset::new(
        format!("{}/data/Fujifilm/X A1/DSCF.RAF", base),
        "DSCF.RAF",
        raw_preview_check::fixture::digest::sha1_hex(&raf),
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::with_http(dir.path()).unwrap();
    let outcomes = cache.materialize(std::slice::from_ref(&asset)).await.unwrap();

    assert_eq!(
        outcomes,
        vec![CacheOutcome::Downloaded {
            bytes: raf.len() as u64
        }]
    );
    assert_eq!(
        *state.seen.lock().await,
        vec!["/data/Fujifilm/X%20A1/DSCF.RAF".to_string()]
    );
    assert_eq!(&cache.read(&asset).await.unwrap()[..], &raf[..]);
}

#[tokio::test]
async fn test_not_found_is_status_error() {
    let base = start_server(ServerState::default()).await;
    let fetcher = HttpFetcher::new().unwrap();

    let result = fetcher.fetch(&format!("{}/data/missing.NEF", base)).await;
    assert!(matches!(
        result,
        Err(FetchError::Status { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_not_found_leaves_asset_unavailable() {
    let base = start_server(ServerState::default()).await;
    let asset = FixtureAsset::new(
        format!("{}/data/missing.NEF", base),
        "missing.NEF",
        "607599813cc5ea65e81595e07955a51f281bf0b7",
    )
    .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let cache = FixtureCache::with_http(dir.path()).unwrap();
    let outcomes = cache.materialize(std::slice::from_ref(&asset)).await.unwrap();

    assert!(matches!(outcomes[0], CacheOutcome::Unavailable { .. }));
    assert!(!cache.path_for(&asset).exists());
}
