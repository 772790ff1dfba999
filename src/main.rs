//! raw-preview-check - verify that camera RAW files produce thumbnails.
//!
//! This binary wires the fixture cache, a file store and the preview service
//! together and reports per-format results.

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use raw_preview_check::{
    config::{CheckConfig, Cli, Command, FetchConfig, FixtureArgs, ListConfig, OutputFormat},
    fixture::{CacheOutcome, CacheStatus, FixtureAsset, FixtureCache, HttpFetcher},
    harness::{AssetVerdict, CheckReport, ConversionCheck},
    preview::RawPreviewService,
    store::{FileStore, LocalFileStore, MemoryFileStore},
};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.into_command() {
        Command::Fetch(config) => run_fetch(config).await,
        Command::Check(config) => run_check(config).await,
        Command::List(config) => run_list(config).await,
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "raw_preview_check=debug"
    } else {
        "raw_preview_check=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Build an HTTP-backed fixture cache, logging the failure if any.
fn http_cache(dir: std::path::PathBuf) -> Option<FixtureCache<HttpFetcher>> {
    match FixtureCache::with_http(dir) {
        Ok(cache) => Some(cache),
        Err(e) => {
            error!("Failed to create HTTP client: {}", e);
            None
        }
    }
}

async fn load_assets(fixtures: &FixtureArgs) -> Option<Vec<FixtureAsset>> {
    match fixtures.load_assets().await {
        Ok(assets) => Some(assets),
        Err(e) => {
            error!("{}", e);
            None
        }
    }
}

// =============================================================================
// Fetch Command
// =============================================================================

async fn run_fetch(config: FetchConfig) -> ExitCode {
    let Some(assets) = load_assets(&config.fixtures).await else {
        return ExitCode::FAILURE;
    };
    let Some(cache) = http_cache(config.fixtures.cache_dir()) else {
        return ExitCode::FAILURE;
    };

    info!("Materializing {} fixture(s) into {}", assets.len(), cache.dir().display());

    let outcomes = match cache.materialize(&assets).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    for (asset, outcome) in assets.iter().zip(&outcomes) {
        match outcome {
            CacheOutcome::Hit => println!("✓ {} (cached)", asset.file_name),
            CacheOutcome::Downloaded { bytes } => {
                println!("✓ {} (downloaded, {:.2} MB)", asset.file_name, mb(*bytes))
            }
            CacheOutcome::Unavailable { reason } => {
                println!("✗ {}: {}", asset.file_name, reason)
            }
        }
    }

    if outcomes.iter().all(CacheOutcome::is_available) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

// =============================================================================
// Check Command
// =============================================================================

async fn run_check(config: CheckConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let Some(assets) = load_assets(&config.fixtures).await else {
        return ExitCode::FAILURE;
    };
    let Some(cache) = http_cache(config.fixtures.cache_dir()) else {
        return ExitCode::FAILURE;
    };

    if config.skip_fetch {
        info!("Skipping fixture download");
    } else if let Err(e) = cache.materialize(&assets).await {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    let result = match &config.store_dir {
        Some(dir) => {
            info!("Using on-disk store at {}", dir.display());
            run_with_store(&config, &assets, &cache, Arc::new(LocalFileStore::new(dir))).await
        }
        None => run_with_store(&config, &assets, &cache, Arc::new(MemoryFileStore::new())).await,
    };

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            error!("Check aborted: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match config.format {
        OutputFormat::Text => print_report(&report),
        OutputFormat::Json => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                error!("Failed to serialize report: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    if report.passed() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run_with_store<S: FileStore>(
    config: &CheckConfig,
    assets: &[FixtureAsset],
    cache: &FixtureCache<HttpFetcher>,
    store: Arc<S>,
) -> Result<CheckReport, raw_preview_check::error::CheckError> {
    let previews = RawPreviewService::with_options(
        store.clone(),
        config.preview_cache_bytes,
        config.jpeg_quality,
    );

    ConversionCheck::new(assets, cache, store.as_ref(), &previews)
        .with_options(config.check_options())
        .run()
        .await
}

fn print_report(report: &CheckReport) {
    println!("RAW Preview Check ({}x{}, user {})", report.width, report.height, report.user);
    println!("═════════════════════════════════");
    println!();

    for result in &report.assets {
        match &result.verdict {
            AssetVerdict::Passed { preview } => println!(
                "✓ {}: {} ({}x{}, {} bytes)",
                result.file_name,
                preview.name,
                preview.width,
                preview.height,
                preview.size()
            ),
            other => println!("✗ {}: {}", result.file_name, other.label()),
        }
    }

    for failure in &report.teardown_failures {
        println!("✗ cleanup of {}: {}", failure.file_name, failure.message);
    }

    println!();
    println!("═════════════════════════════════");
    if report.passed() {
        println!("✓ All {} preview(s) generated", report.assets.len());
    } else {
        println!(
            "✗ {} of {} preview(s) generated",
            report.passed_count(),
            report.assets.len()
        );
    }
}

// =============================================================================
// List Command
// =============================================================================

async fn run_list(config: ListConfig) -> ExitCode {
    let Some(assets) = load_assets(&config.fixtures).await else {
        return ExitCode::FAILURE;
    };
    let Some(cache) = http_cache(config.fixtures.cache_dir()) else {
        return ExitCode::FAILURE;
    };

    println!("Fixtures (cache: {})", cache.dir().display());
    println!("─────────────────");

    for asset in &assets {
        let status = match cache.status(asset).await {
            Ok(CacheStatus::Valid) => "cached".to_string(),
            Ok(CacheStatus::Corrupt) => "digest mismatch".to_string(),
            Ok(CacheStatus::Absent) => "not cached".to_string(),
            Err(e) => e.to_string(),
        };
        println!("  {:<48} {:<16} {}", asset.file_name, status, asset.source_url);
    }

    println!();
    println!("Total: {} fixture(s)", assets.len());
    ExitCode::SUCCESS
}

fn mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
