//! TIFF tag value reading.
//!
//! Values can be stored either inline in the IFD entry (four bytes or less)
//! or at an offset in the file. Arrays are fetched with a single range read.

use bytes::Bytes;

use crate::error::TiffError;
use crate::io::RangeReader;

use super::parser::{ByteOrder, IfdEntry, TiffHeader};
use super::tags::FieldType;

/// Upper bound for a single tag value; guards against corrupt counts.
const MAX_VALUE_BYTES: u64 = 1024 * 1024;

// =============================================================================
// ValueReader
// =============================================================================

/// Reads tag values from a TIFF file, respecting its byte order.
pub struct ValueReader<'a, R: RangeReader> {
    reader: &'a R,
    header: &'a TiffHeader,
}

impl<'a, R: RangeReader> ValueReader<'a, R> {
    /// Create a new ValueReader.
    pub fn new(reader: &'a R, header: &'a TiffHeader) -> Self {
        Self { reader, header }
    }

    /// Get the byte order from the header.
    #[inline]
    pub fn byte_order(&self) -> ByteOrder {
        self.header.byte_order
    }

    /// Read raw bytes for an IFD entry's value.
    ///
    /// For inline values, returns the bytes from the entry.
    /// For offset values, fetches the bytes from the file.
    pub async fn read_bytes(&self, entry: &IfdEntry) -> Result<Bytes, TiffError> {
        let size = entry
            .value_byte_size()
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if size > MAX_VALUE_BYTES {
            return Err(TiffError::InvalidTagValue {
                tag: "unknown",
                message: format!("value of {} bytes exceeds limit", size),
            });
        }

        if entry.is_inline {
            Ok(Bytes::copy_from_slice(
                &entry.value_offset_bytes[..size as usize],
            ))
        } else {
            let offset = entry.value_offset(self.header.byte_order);
            let bytes = self.reader.read_exact_at(offset, size as usize).await?;
            Ok(bytes)
        }
    }

    /// Read a single unsigned value from an entry.
    ///
    /// Handles Short, Long and IFD field types.
    pub async fn read_u32(&self, entry: &IfdEntry) -> Result<u32, TiffError> {
        if let Some(value) = entry.inline_u32(self.header.byte_order) {
            return Ok(value);
        }

        let values = self.read_u32_array(entry).await?;
        match values.as_slice() {
            [value] => Ok(*value),
            _ => Err(TiffError::InvalidTagValue {
                tag: "unknown",
                message: format!("expected count 1, got {}", entry.count),
            }),
        }
    }

    /// Read an array of unsigned values (strip offsets, SubIFD offsets, ...).
    pub async fn read_u32_array(&self, entry: &IfdEntry) -> Result<Vec<u32>, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if !field_type.is_unsigned_integer() {
            return Err(TiffError::InvalidTagValue {
                tag: "unknown",
                message: format!("expected Short, Long or IFD, got {:?}", field_type),
            });
        }

        let count = entry.count as usize;
        if count == 0 {
            return Ok(Vec::new());
        }

        let bytes = self.read_bytes(entry).await?;
        let byte_order = self.header.byte_order;
        let width = field_type.size_in_bytes();

        let values = bytes
            .chunks_exact(width)
            .take(count)
            .map(|chunk| match field_type {
                FieldType::Short => byte_order.read_u16(chunk) as u32,
                _ => byte_order.read_u32(chunk),
            })
            .collect();

        Ok(values)
    }

    /// Read a string value from an entry (ASCII type).
    ///
    /// Stops at the first NUL and trims trailing spaces, which some cameras
    /// use as padding in `Make`.
    pub async fn read_string(&self, entry: &IfdEntry) -> Result<String, TiffError> {
        let field_type = entry
            .field_type
            .ok_or(TiffError::UnknownFieldType(entry.field_type_raw))?;

        if field_type != FieldType::Ascii {
            return Err(TiffError::InvalidTagValue {
                tag: "unknown",
                message: format!("expected Ascii type for string, got {:?}", field_type),
            });
        }

        let bytes = self.read_bytes(entry).await?;
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        let s = String::from_utf8_lossy(&bytes[..end]).trim_end().to_string();

        Ok(s)
    }
}

// =============================================================================
// Tests
// =============================================================================
