//! Content digests used to verify fixtures and tag stored files.

use sha1::{Digest, Sha1};
use sha2::Sha256;

/// Hash algorithm of an expected digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DigestAlgorithm {
    Sha1,
    Sha256,
}

impl DigestAlgorithm {
    /// Infer the algorithm from the length of a hex digest.
    pub fn from_hex_len(len: usize) -> Option<Self> {
        match len {
            40 => Some(DigestAlgorithm::Sha1),
            64 => Some(DigestAlgorithm::Sha256),
            _ => None,
        }
    }

    /// Hex-encoded digest of `data`.
    pub fn hex_digest(&self, data: &[u8]) -> String {
        match self {
            DigestAlgorithm::Sha1 => sha1_hex(data),
            DigestAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            DigestAlgorithm::Sha1 => "sha1",
            DigestAlgorithm::Sha256 => "sha256",
        }
    }
}

/// Lowercase hex SHA-1 of `data`.
pub fn sha1_hex(data: &[u8]) -> String {
    hex::encode(Sha1::digest(data))
}

/// Whether `hex` is a well-formed digest for some supported algorithm.
pub fn is_hex_digest(hex: &str) -> bool {
    DigestAlgorithm::from_hex_len(hex.len()).is_some()
        && hex.bytes().all(|b| b.is_ascii_hexdigit())
}
