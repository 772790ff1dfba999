use async_trait::async_trait;
use bytes::Bytes;

use super::RangeReader;
use crate::error::IoError;

/// [`RangeReader`] over an in-memory buffer.
///
/// Slicing a [`Bytes`] is reference-counted, so every range read is zero-copy.
#[derive(Debug, Clone)]
pub struct MemoryReader {
    data: Bytes,
    identifier: String,
}

impl MemoryReader {
    /// Create a reader over `data`, labelled `identifier` in logs.
    pub fn new(data: Bytes, identifier: impl Into<String>) -> Self {
        Self {
            data,
            identifier: identifier.into(),
        }
    }

    /// The whole underlying buffer.
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }
}

#[async_trait]
impl RangeReader for MemoryReader {
    async fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        let size = self.data.len() as u64;
        let end = offset.checked_add(len as u64);
        match end {
            Some(end) if end <= size => Ok(self.data.slice(offset as usize..end as usize)),
            _ => Err(IoError::RangeOutOfBounds {
                offset,
                requested: len as u64,
                size,
            }),
        }
    }

    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
