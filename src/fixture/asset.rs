//! Fixture asset definitions and manifest loading.

use std::path::Path;

use serde::Deserialize;

use super::digest::{is_hex_digest, DigestAlgorithm};
use crate::error::FixtureError;
use crate::store::check_file_name;

// =============================================================================
// FixtureAsset
// =============================================================================

/// A remote RAW sample with a known content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixtureAsset {
    /// Where the bytes come from
    pub source_url: String,

    /// Local cache name and store file name
    pub file_name: String,

    /// Lowercase hex digest of the content
    pub expected_digest: String,

    /// Algorithm implied by the digest length
    pub algorithm: DigestAlgorithm,
}

impl FixtureAsset {
    /// Create an asset, validating the file name and digest.
    pub fn new(
        source_url: impl Into<String>,
        file_name: impl Into<String>,
        expected_digest: impl Into<String>,
    ) -> Result<Self, FixtureError> {
        let source_url = source_url.into();
        let file_name = file_name.into();
        let expected_digest = expected_digest.into().to_ascii_lowercase();

        let invalid = |reason: String| FixtureError::InvalidAsset {
            file_name: file_name.clone(),
            reason,
        };

        check_file_name(&file_name).map_err(|r| invalid(r.to_string()))?;

        if source_url.trim().is_empty() {
            return Err(invalid("source URL is empty".to_string()));
        }

        let algorithm = match DigestAlgorithm::from_hex_len(expected_digest.len()) {
            Some(algorithm) if is_hex_digest(&expected_digest) => algorithm,
            _ => {
                return Err(invalid(format!(
                    "digest must be 40 (sha1) or 64 (sha256) hex characters, got {:?}",
                    expected_digest
                )))
            }
        };

        Ok(Self {
            source_url,
            file_name,
            expected_digest,
            algorithm,
        })
    }

    /// Whether `data` hashes to the expected digest.
    pub fn matches(&self, data: &[u8]) -> bool {
        self.algorithm.hex_digest(data) == self.expected_digest
    }

    /// Source URL with spaces percent-encoded.
    pub fn fetch_url(&self) -> String {
        encode_source_url(&self.source_url)
    }
}

/// Percent-encode spaces, the only unsafe character in archive paths.
pub fn encode_source_url(url: &str) -> String {
    url.replace(' ', "%20")
}

// =============================================================================
// Default Fixture List
// =============================================================================

/// `(file_name, source_url, sha1)` for each default fixture.
const DEFAULT_ASSETS: &[(&str, &str, &str)] = &[
    (
        "Фото\".NEF",
        "https://raw.pixls.us/data/Nikon/D600/DSC_3297.NEF",
        "607599813cc5ea65e81595e07955a51f281bf0b7",
    ),
    (
        "Canon_EOS_50D.CR2",
        "https://raw.pixls.us/data/Canon/EOS 50D/IMG_9518.CR2",
        "eea0eaa8bf907d483b6234eab001fdc85848c80b",
    ),
    (
        "Canon_EOS_5D_Mark_III.compressed-lossless.DNG",
        "https://raw.pixls.us/data/Adobe DNG Converter/Canon EOS 5D Mark III/5G4A9395-compressed-lossless.DNG",
        "a18d4dae67cfc0a9673c01b2d4f14fab4be68580",
    ),
    (
        "Canon_EOS_2000C.TIF",
        "https://raw.pixls.us/data/Canon/EOS D2000C/RAW_CANON_D2000.TIF",
        "b68b5c7d4b944fff0ad9d28e68f405f957429c49",
    ),
    (
        "Fujifilm_X-A1_DSCF2482.RAF",
        "https://raw.pixls.us/data/Fujifilm/X-A1/DSCF2482.RAF",
        "82e625be5689bbd08a08dd9a9c5d38e21c80bf33",
    ),
    (
        "Hasselblad_CF132.3FR",
        "https://raw.pixls.us/data/Hasselblad/CF132/RAW_HASSELBLAD_IXPRESS_CF132.3FR",
        "bcaa4c329711a8effb59682a99df3f2b15009d87",
    ),
];

/// The built-in fixture list: one sample per supported RAW family.
pub fn default_assets() -> Vec<FixtureAsset> {
    DEFAULT_ASSETS
        .iter()
        .map(|(file_name, url, sha1)| FixtureAsset {
            source_url: url.to_string(),
            file_name: file_name.to_string(),
            expected_digest: sha1.to_string(),
            algorithm: DigestAlgorithm::Sha1,
        })
        .collect()
}

// =============================================================================
// Manifest
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ManifestEntry {
    url: String,
    filename: String,
    #[serde(default)]
    sha1: Option<String>,
    #[serde(default)]
    sha256: Option<String>,
}

/// Parse a JSON manifest: an array of `{ url, filename, sha1 | sha256 }`.
pub fn parse_manifest(json: &str, origin: &str) -> Result<Vec<FixtureAsset>, FixtureError> {
    let entries: Vec<ManifestEntry> =
        serde_json::from_str(json).map_err(|e| FixtureError::Manifest {
            path: origin.to_string(),
            message: e.to_string(),
        })?;

    entries
        .into_iter()
        .map(|entry| {
            let digest = match (entry.sha1, entry.sha256) {
                (Some(d), None) | (None, Some(d)) => d,
                _ => {
                    return Err(FixtureError::InvalidAsset {
                        file_name: entry.filename,
                        reason: "exactly one of sha1 or sha256 is required".to_string(),
                    })
                }
            };
            FixtureAsset::new(entry.url, entry.filename, digest)
        })
        .collect()
}

/// Read and parse a manifest file.
pub async fn load_manifest(path: &Path) -> Result<Vec<FixtureAsset>, FixtureError> {
    let json = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| FixtureError::Manifest {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    parse_manifest(&json, &path.display().to_string())
}
