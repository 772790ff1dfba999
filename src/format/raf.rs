//! Fujifilm RAF header parsing.
//!
//! RAF is not a TIFF container. Its fixed big-endian header names the
//! location of a full JPEG preview directly:
//!
//! ```text
//! Bytes  0-15: "FUJIFILMCCD-RAW "
//! Bytes 16-83: format version, camera ID and model string
//! Bytes 84-87: JPEG preview offset
//! Bytes 88-91: JPEG preview length
//! ```

use crate::error::FormatError;

/// Magic string at the start of every RAF file.
pub const RAF_MAGIC: &[u8; 16] = b"FUJIFILMCCD-RAW ";

/// Bytes needed to read the preview location.
pub const RAF_HEADER_SIZE: usize = 92;

const JPEG_OFFSET_POS: usize = 84;
const JPEG_LENGTH_POS: usize = 88;

/// Location of the embedded JPEG named by a RAF header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RafHeader {
    pub jpeg_offset: u64,
    pub jpeg_length: u64,
}

impl RafHeader {
    /// Parse the header and check the preview lies inside the file.
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, FormatError> {
        if !is_raf_header(bytes) {
            return Err(FormatError::InvalidRaf("missing FUJIFILMCCD-RAW magic".to_string()));
        }
        if bytes.len() < RAF_HEADER_SIZE {
            return Err(FormatError::InvalidRaf(format!(
                "header truncated: need {} bytes, got {}",
                RAF_HEADER_SIZE,
                bytes.len()
            )));
        }

        let jpeg_offset = read_u32_be(&bytes[JPEG_OFFSET_POS..]) as u64;
        let jpeg_length = read_u32_be(&bytes[JPEG_LENGTH_POS..]) as u64;

        if jpeg_length == 0 || jpeg_offset + jpeg_length > file_size {
            return Err(FormatError::InvalidRaf(format!(
                "preview range {}+{} outside file of {} bytes",
                jpeg_offset, jpeg_length, file_size
            )));
        }

        Ok(Self {
            jpeg_offset,
            jpeg_length,
        })
    }
}

/// Quick magic check.
pub fn is_raf_header(bytes: &[u8]) -> bool {
    bytes.starts_with(RAF_MAGIC)
}

#[inline]
fn read_u32_be(bytes: &[u8]) -> u32 {
    u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}
