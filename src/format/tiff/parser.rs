//! TIFF header and IFD parsing.
//!
//! # Header Structure
//!
//! ```text
//! Bytes 0-1: Byte order (0x4949 = little-endian "II", 0x4D4D = big-endian "MM")
//! Bytes 2-3: Version (42, or a vendor magic: "RO"/"RS" Olympus, 0x55 Panasonic)
//! Bytes 4-7: Offset to first IFD
//! Bytes 8-9: "CR" in Canon CR2 files
//! ```
//!
//! # IFD Structure
//!
//! ```text
//! 2 bytes:       entry count N
//! N * 12 bytes:  entries (2 tag + 2 type + 4 count + 4 value/offset)
//! 4 bytes:       offset of the next IFD (0 = end of chain)
//! ```

use crate::error::TiffError;
use crate::io::RangeReader;

use super::tags::{FieldType, TiffTag};

// =============================================================================
// Constants
// =============================================================================

/// Magic bytes indicating little-endian byte order ("II" for Intel)
const BYTE_ORDER_LITTLE_ENDIAN: u16 = 0x4949;

/// Magic bytes indicating big-endian byte order ("MM" for Motorola)
const BYTE_ORDER_BIG_ENDIAN: u16 = 0x4D4D;

/// Version number for standard TIFF
const VERSION_TIFF: u16 = 42;

/// Olympus ORF version words ("RO" and "RS" read in file byte order)
const VERSION_OLYMPUS_RO: u16 = 0x4F52;
const VERSION_OLYMPUS_RS: u16 = 0x5352;

/// Panasonic RW2 version word
const VERSION_PANASONIC: u16 = 0x0055;

/// Marker following the header in Canon CR2 files
const CR2_MARKER: &[u8; 2] = b"CR";

/// Size of a classic TIFF header in bytes
pub const TIFF_HEADER_SIZE: usize = 8;

/// Size of one IFD entry
const IFD_ENTRY_SIZE: usize = 12;

/// Upper bound on entries per IFD; real RAW files stay well below this
const MAX_IFD_ENTRIES: u16 = 1024;

// =============================================================================
// ByteOrder
// =============================================================================

/// Byte order (endianness) of a TIFF file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    /// Little-endian ("II" = Intel)
    LittleEndian,
    /// Big-endian ("MM" = Motorola)
    BigEndian,
}

impl ByteOrder {
    /// Read a u16 from the first two bytes of a slice.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 2 bytes.
    #[inline]
    pub fn read_u16(self, bytes: &[u8]) -> u16 {
        let raw = [bytes[0], bytes[1]];
        match self {
            ByteOrder::LittleEndian => u16::from_le_bytes(raw),
            ByteOrder::BigEndian => u16::from_be_bytes(raw),
        }
    }

    /// Read a u32 from the first four bytes of a slice.
    ///
    /// # Panics
    /// Panics if the slice has fewer than 4 bytes.
    #[inline]
    pub fn read_u32(self, bytes: &[u8]) -> u32 {
        let raw = [bytes[0], bytes[1], bytes[2], bytes[3]];
        match self {
            ByteOrder::LittleEndian => u32::from_le_bytes(raw),
            ByteOrder::BigEndian => u32::from_be_bytes(raw),
        }
    }
}

// =============================================================================
// TiffHeader
// =============================================================================

/// Vendor variant announced by the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderVariant {
    /// Plain TIFF header (NEF, DNG, 3FR, TIF, ...)
    Standard,
    /// Standard header followed by the Canon `CR` marker
    CanonCr2,
    /// Olympus ORF
    Olympus,
    /// Panasonic RW2
    Panasonic,
}

/// Parsed TIFF file header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TiffHeader {
    /// Byte order for all multi-byte values in the file
    pub byte_order: ByteOrder,

    /// Vendor variant of the header
    pub variant: HeaderVariant,

    /// Offset to the first IFD in the file
    pub first_ifd_offset: u64,
}

impl TiffHeader {
    /// Parse a TIFF header from raw bytes.
    ///
    /// Pass at least 10 bytes to allow CR2 detection; 8 is the minimum.
    ///
    /// # Errors
    /// - `FileTooSmall` if fewer than 8 bytes are given
    /// - `InvalidMagic` if byte order bytes are not II or MM
    /// - `InvalidVersion` if the version word is not recognized
    /// - `InvalidIfdOffset` if the first IFD offset is outside the file
    pub fn parse(bytes: &[u8], file_size: u64) -> Result<Self, TiffError> {
        if bytes.len() < TIFF_HEADER_SIZE {
            return Err(TiffError::FileTooSmall {
                required: TIFF_HEADER_SIZE as u64,
                actual: bytes.len() as u64,
            });
        }

        // Read as little-endian because we're matching fixed byte patterns
        let magic = u16::from_le_bytes([bytes[0], bytes[1]]);
        let byte_order = match magic {
            BYTE_ORDER_LITTLE_ENDIAN => ByteOrder::LittleEndian,
            BYTE_ORDER_BIG_ENDIAN => ByteOrder::BigEndian,
            _ => return Err(TiffError::InvalidMagic(magic)),
        };

        let version = byte_order.read_u16(&bytes[2..4]);
        let variant = match version {
            VERSION_TIFF => {
                if bytes.len() >= 10 && &bytes[8..10] == CR2_MARKER {
                    HeaderVariant::CanonCr2
                } else {
                    HeaderVariant::Standard
                }
            }
            VERSION_OLYMPUS_RO | VERSION_OLYMPUS_RS => HeaderVariant::Olympus,
            VERSION_PANASONIC => HeaderVariant::Panasonic,
            _ => return Err(TiffError::InvalidVersion(version)),
        };

        let first_ifd_offset = byte_order.read_u32(&bytes[4..8]) as u64;
        if first_ifd_offset < TIFF_HEADER_SIZE as u64 || first_ifd_offset >= file_size {
            return Err(TiffError::InvalidIfdOffset(first_ifd_offset));
        }

        Ok(TiffHeader {
            byte_order,
            variant,
            first_ifd_offset,
        })
    }
}

// =============================================================================
// IfdEntry
// =============================================================================

/// One 12-byte IFD entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfdEntry {
    /// Numeric tag ID (kept even for tags without a [`TiffTag`] variant)
    pub tag_id: u16,

    /// Decoded field type, `None` if the type is not one we understand
    pub field_type: Option<FieldType>,

    /// Raw field type as stored in the file
    pub field_type_raw: u16,

    /// Number of values
    pub count: u32,

    /// The 4-byte value/offset field, unmodified
    pub value_offset_bytes: [u8; 4],

    /// Whether the value is stored in `value_offset_bytes`
    pub is_inline: bool,
}

impl IfdEntry {
    /// Parse an entry from its 12 bytes.
    fn parse(bytes: &[u8], byte_order: ByteOrder) -> Self {
        let tag_id = byte_order.read_u16(&bytes[0..2]);
        let field_type_raw = byte_order.read_u16(&bytes[2..4]);
        let field_type = FieldType::from_u16(field_type_raw);
        let count = byte_order.read_u32(&bytes[4..8]);
        let value_offset_bytes = [bytes[8], bytes[9], bytes[10], bytes[11]];
        let is_inline = field_type.is_some_and(|t| t.fits_inline(count));

        Self {
            tag_id,
            field_type,
            field_type_raw,
            count,
            value_offset_bytes,
            is_inline,
        }
    }

    /// Total size of the value in bytes, `None` for unknown field types.
    pub fn value_byte_size(&self) -> Option<u64> {
        self.field_type
            .map(|t| t.size_in_bytes() as u64 * self.count as u64)
    }

    /// The value/offset field interpreted as an offset.
    #[inline]
    pub fn value_offset(&self, byte_order: ByteOrder) -> u64 {
        byte_order.read_u32(&self.value_offset_bytes) as u64
    }

    /// Single unsigned value stored inline, if this entry holds one.
    pub fn inline_u32(&self, byte_order: ByteOrder) -> Option<u32> {
        if !self.is_inline || self.count != 1 {
            return None;
        }
        match self.field_type? {
            FieldType::Short => Some(byte_order.read_u16(&self.value_offset_bytes) as u32),
            FieldType::Long | FieldType::Ifd => Some(byte_order.read_u32(&self.value_offset_bytes)),
            _ => None,
        }
    }
}

// =============================================================================
// Ifd
// =============================================================================

/// A parsed Image File Directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ifd {
    /// Offset this IFD was read from
    pub offset: u64,

    /// Entries in file order
    pub entries: Vec<IfdEntry>,

    /// Offset of the next IFD in the chain, 0 if this is the last
    pub next_ifd_offset: u64,
}

impl Ifd {
    /// Bytes occupied by an IFD with `entry_count` entries.
    #[inline]
    pub const fn calculate_size(entry_count: u16) -> usize {
        2 + entry_count as usize * IFD_ENTRY_SIZE + 4
    }

    /// Parse an IFD from bytes that start at its entry count.
    pub fn parse(bytes: &[u8], offset: u64, byte_order: ByteOrder) -> Result<Self, TiffError> {
        if bytes.len() < 2 {
            return Err(TiffError::FileTooSmall {
                required: 2,
                actual: bytes.len() as u64,
            });
        }

        let entry_count = byte_order.read_u16(&bytes[0..2]);
        let required = Self::calculate_size(entry_count);
        if bytes.len() < required {
            return Err(TiffError::FileTooSmall {
                required: required as u64,
                actual: bytes.len() as u64,
            });
        }

        let entries = (0..entry_count as usize)
            .map(|i| {
                let start = 2 + i * IFD_ENTRY_SIZE;
                IfdEntry::parse(&bytes[start..start + IFD_ENTRY_SIZE], byte_order)
            })
            .collect();

        let next_pos = 2 + entry_count as usize * IFD_ENTRY_SIZE;
        let next_ifd_offset = byte_order.read_u32(&bytes[next_pos..next_pos + 4]) as u64;

        Ok(Self {
            offset,
            entries,
            next_ifd_offset,
        })
    }

    /// Read and parse the IFD at `offset`.
    pub async fn read<R: RangeReader>(
        reader: &R,
        header: &TiffHeader,
        offset: u64,
    ) -> Result<Self, TiffError> {
        if offset < TIFF_HEADER_SIZE as u64 || offset + 2 > reader.size() {
            return Err(TiffError::InvalidIfdOffset(offset));
        }

        let count_bytes = reader.read_exact_at(offset, 2).await?;
        let entry_count = header.byte_order.read_u16(&count_bytes);
        if entry_count > MAX_IFD_ENTRIES {
            return Err(TiffError::InvalidTagValue {
                tag: "IFD",
                message: format!("implausible entry count {} at offset {}", entry_count, offset),
            });
        }

        let bytes = reader
            .read_exact_at(offset, Self::calculate_size(entry_count))
            .await?;
        Self::parse(&bytes, offset, header.byte_order)
    }

    /// Find an entry by tag.
    pub fn get_entry_by_tag(&self, tag: TiffTag) -> Option<&IfdEntry> {
        let id = tag.as_u16();
        self.entries.iter().find(|e| e.tag_id == id)
    }

    /// Inline single-value lookup, the common case for sizes and offsets.
    pub fn get_u32(&self, tag: TiffTag, byte_order: ByteOrder) -> Option<u32> {
        self.get_entry_by_tag(tag)
            .and_then(|e| e.inline_u32(byte_order))
    }
}

// =============================================================================
// Tests
// =============================================================================
