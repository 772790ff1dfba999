use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Trait for reading byte ranges from a stored file.
///
/// This abstraction lets the TIFF and RAF parsers locate embedded previews
/// without caring where the file lives. Implementations must be thread-safe.
#[async_trait]
pub trait RangeReader: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns an error if the range is out of bounds or if the read fails.
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError>;

    /// Get the total size of the resource in bytes.
    fn size(&self) -> u64;

    /// Get an identifier for this resource (for logging).
    fn identifier(&self) -> &str;

    /// Read up to `len` bytes starting at `offset`, truncated at end of file.
    async fn read_at_most(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let size = self.size();
        if offset >= size {
            return Ok(Bytes::new());
        }
        let available = (size - offset).min(len as u64) as usize;
        self.read_exact_at(offset, available).await
    }
}
