//! Configuration management for raw-preview-check.
//!
//! Options come from command-line arguments via clap, with environment
//! variable fallbacks and defaults for everything.
//!
//! # Environment Variables
//!
//! - `RAWPREVIEW_CACHE_DIR` - Local fixture cache (default: system temp dir)
//! - `RAWPREVIEW_MANIFEST` - JSON fixture manifest (default: built-in list)
//! - `RAWPREVIEW_STORE_DIR` - On-disk file store root (default: in-memory)
//! - `RAWPREVIEW_USER` - User whose folder receives fixtures (default: admin)
//! - `RAWPREVIEW_WIDTH` - Thumbnail box width (default: 100)
//! - `RAWPREVIEW_HEIGHT` - Thumbnail box height (default: 100)
//! - `RAWPREVIEW_JPEG_QUALITY` - Thumbnail JPEG quality (default: 80)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::FixtureError;
use crate::fixture::{default_assets, default_cache_dir, load_manifest, FixtureAsset};
use crate::harness::{CheckOptions, DEFAULT_PREVIEW_SIZE, DEFAULT_USER};
use crate::preview::{is_valid_quality, DEFAULT_JPEG_QUALITY, DEFAULT_PREVIEW_CACHE_CAPACITY};
use crate::store::check_file_name;

// =============================================================================
// Default Values
// =============================================================================

/// Largest accepted thumbnail edge.
pub const MAX_PREVIEW_SIZE: u32 = 4096;

// =============================================================================
// CLI Arguments
// =============================================================================

/// raw-preview-check - verify that camera RAW files produce thumbnails.
///
/// Downloads a fixed set of RAW samples into a local cache (verified by
/// digest), uploads each into a file store, requests a thumbnail and reports
/// which formats failed.
#[derive(Parser, Debug, Clone)]
#[command(name = "raw-preview-check")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download and verify fixtures into the local cache.
    Fetch(FetchConfig),

    /// Run the conversion check against every fixture.
    Check(CheckConfig),

    /// List fixtures and their cache state.
    List(ListConfig),
}

// =============================================================================
// Fixture Arguments
// =============================================================================

/// Where fixtures come from and where they are cached.
#[derive(Args, Debug, Clone, Default)]
pub struct FixtureArgs {
    /// Directory holding cached fixtures.
    ///
    /// Defaults to the system temp directory.
    #[arg(long, env = "RAWPREVIEW_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// JSON manifest replacing the built-in fixture list.
    ///
    /// Format: `[{"url": ..., "filename": ..., "sha1" | "sha256": ...}]`
    #[arg(long, env = "RAWPREVIEW_MANIFEST")]
    pub manifest: Option<PathBuf>,
}

impl FixtureArgs {
    /// The cache directory to use.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(default_cache_dir)
    }

    /// Load the fixture list: the manifest if given, otherwise the defaults.
    pub async fn load_assets(&self) -> Result<Vec<FixtureAsset>, FixtureError> {
        match &self.manifest {
            Some(path) => load_manifest(path).await,
            None => Ok(default_assets()),
        }
    }
}

// =============================================================================
// Fetch Command
// =============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct FetchConfig {
    #[command(flatten)]
    pub fixtures: FixtureArgs,
}

// =============================================================================
// Check Command
// =============================================================================

/// Output format for the check report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// Pretty-printed JSON report
    Json,
}

#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub fixtures: FixtureArgs,

    /// Root of an on-disk file store.
    ///
    /// Without it, files are stored in memory for the duration of the run.
    #[arg(long, env = "RAWPREVIEW_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// User whose folder receives the fixtures.
    #[arg(long, default_value = DEFAULT_USER, env = "RAWPREVIEW_USER")]
    pub user: String,

    /// Thumbnail bounding box width.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_SIZE, env = "RAWPREVIEW_WIDTH")]
    pub width: u32,

    /// Thumbnail bounding box height.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_SIZE, env = "RAWPREVIEW_HEIGHT")]
    pub height: u32,

    /// JPEG quality of generated thumbnails (1-100).
    #[arg(long, default_value_t = DEFAULT_JPEG_QUALITY, env = "RAWPREVIEW_JPEG_QUALITY")]
    pub jpeg_quality: u8,

    /// Preview cache capacity in bytes.
    #[arg(long, default_value_t = DEFAULT_PREVIEW_CACHE_CAPACITY)]
    pub preview_cache_bytes: usize,

    /// Use the cache as is; do not download missing fixtures.
    #[arg(long, default_value_t = false)]
    pub skip_fetch: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl CheckConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if let Err(reason) = check_file_name(&self.user) {
            return Err(format!("Invalid user {:?}: {}", self.user, reason));
        }

        if !(1..=MAX_PREVIEW_SIZE).contains(&self.width) {
            return Err(format!("width must be between 1 and {}", MAX_PREVIEW_SIZE));
        }
        if !(1..=MAX_PREVIEW_SIZE).contains(&self.height) {
            return Err(format!("height must be between 1 and {}", MAX_PREVIEW_SIZE));
        }

        if !is_valid_quality(self.jpeg_quality) {
            return Err("jpeg_quality must be between 1 and 100".to_string());
        }

        Ok(())
    }

    /// Harness parameters derived from this configuration.
    pub fn check_options(&self) -> CheckOptions {
        CheckOptions {
            user: self.user.clone(),
            width: self.width,
            height: self.height,
        }
    }
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            fixtures: FixtureArgs::default(),
            store_dir: None,
            user: DEFAULT_USER.to_string(),
            width: DEFAULT_PREVIEW_SIZE,
            height: DEFAULT_PREVIEW_SIZE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            preview_cache_bytes: DEFAULT_PREVIEW_CACHE_CAPACITY,
            skip_fetch: false,
            format: OutputFormat::Text,
        }
    }
}

// =============================================================================
// List Command
// =============================================================================

#[derive(Args, Debug, Clone, Default)]
pub struct ListConfig {
    #[command(flatten)]
    pub fixtures: FixtureArgs,
}

// =============================================================================
// Tests
// =============================================================================
