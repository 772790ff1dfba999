use serde::Serialize;

use crate::preview::PreviewFile;

/// Verdict for one asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum AssetVerdict {
    /// A non-empty preview was generated
    Passed { preview: PreviewFile },
    /// The preview service reported "not found"
    PreviewMissing,
    /// A preview was generated but has no content
    EmptyPreview,
}

impl AssetVerdict {
    pub fn passed(&self) -> bool {
        matches!(self, AssetVerdict::Passed { .. })
    }

    pub const fn label(&self) -> &'static str {
        match self {
            AssetVerdict::Passed { .. } => "passed",
            AssetVerdict::PreviewMissing => "preview missing",
            AssetVerdict::EmptyPreview => "empty preview",
        }
    }
}

/// Verdict for one named asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetResult {
    pub file_name: String,
    #[serde(flatten)]
    pub verdict: AssetVerdict,
}

/// A file that could not be removed from the store after the check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeardownFailure {
    pub file_name: String,
    pub message: String,
}

/// Outcome of a completed check run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckReport {
    pub user: String,
    pub width: u32,
    pub height: u32,
    pub assets: Vec<AssetResult>,
    pub teardown_failures: Vec<TeardownFailure>,
}

impl CheckReport {
    /// True when every asset passed and cleanup left nothing behind.
    pub fn passed(&self) -> bool {
        self.assets.iter().all(|a| a.verdict.passed()) && self.teardown_failures.is_empty()
    }

    pub fn passed_count(&self) -> usize {
        self.assets.iter().filter(|a| a.verdict.passed()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &AssetResult> {
        self.assets.iter().filter(|a| !a.verdict.passed())
    }
}
