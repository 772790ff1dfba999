//! TIFF tag and field type definitions.
//!
//! Only the vocabulary needed to walk RAW containers and locate their
//! embedded JPEG previews is defined here.

// =============================================================================
// TIFF Field Types
// =============================================================================

/// TIFF field types that determine how values are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum FieldType {
    /// Unsigned 8-bit integer (1 byte)
    Byte = 1,

    /// 8-bit ASCII character (1 byte)
    Ascii = 2,

    /// Unsigned 16-bit integer (2 bytes)
    Short = 3,

    /// Unsigned 32-bit integer (4 bytes)
    Long = 4,

    /// Two Longs: numerator and denominator (8 bytes)
    Rational = 5,

    /// Undefined byte data (1 byte per element)
    Undefined = 7,

    /// Signed 32-bit integer (4 bytes)
    SLong = 9,

    /// 32-bit offset to a child IFD (4 bytes), used by `SubIFDs`
    Ifd = 13,
}

impl FieldType {
    /// Size of a single value of this type in bytes.
    #[inline]
    pub const fn size_in_bytes(self) -> usize {
        match self {
            FieldType::Byte | FieldType::Ascii | FieldType::Undefined => 1,
            FieldType::Short => 2,
            FieldType::Long | FieldType::SLong | FieldType::Ifd => 4,
            FieldType::Rational => 8,
        }
    }

    /// Create a FieldType from its numeric value.
    ///
    /// Returns `None` for types RAW preview discovery never needs.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(FieldType::Byte),
            2 => Some(FieldType::Ascii),
            3 => Some(FieldType::Short),
            4 => Some(FieldType::Long),
            5 => Some(FieldType::Rational),
            7 => Some(FieldType::Undefined),
            9 => Some(FieldType::SLong),
            13 => Some(FieldType::Ifd),
            _ => None,
        }
    }

    /// Whether values of this type can be read as unsigned offsets/counts.
    #[inline]
    pub const fn is_unsigned_integer(self) -> bool {
        matches!(self, FieldType::Short | FieldType::Long | FieldType::Ifd)
    }

    /// Maximum bytes stored inline in a classic TIFF IFD entry.
    pub const INLINE_THRESHOLD: usize = 4;

    /// Check if `count` values of this type fit in the entry's value field.
    #[inline]
    pub fn fits_inline(self, count: u32) -> bool {
        (self.size_in_bytes() as u64) * (count as u64) <= Self::INLINE_THRESHOLD as u64
    }
}

// =============================================================================
// TIFF Tags
// =============================================================================

/// TIFF tag IDs relevant to RAW preview discovery.
///
/// Tags not listed here are ignored during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum TiffTag {
    /// 0 = full resolution image, 1 = reduced resolution (preview/thumbnail)
    NewSubfileType = 254,

    /// Image width in pixels
    ImageWidth = 256,

    /// Image height (length) in pixels
    ImageLength = 257,

    /// Compression scheme used
    Compression = 259,

    /// Camera manufacturer
    Make = 271,

    /// Camera model
    Model = 272,

    /// Byte offsets of strips
    StripOffsets = 273,

    /// EXIF orientation (1-8)
    Orientation = 274,

    /// Byte counts of strips
    StripByteCounts = 279,

    /// Offsets of child IFDs (NEF and DNG keep previews here)
    SubIfds = 330,

    /// Offset of a complete JPEG stream (a.k.a. JpgFromRaw / ThumbnailOffset)
    JpegInterchangeFormat = 513,

    /// Length of the stream pointed to by `JpegInterchangeFormat`
    JpegInterchangeFormatLength = 514,

    /// Offset of the EXIF IFD
    ExifIfd = 34665,

    /// Present only in DNG files
    DngVersion = 50706,
}

impl TiffTag {
    /// Create a TiffTag from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            254 => Some(TiffTag::NewSubfileType),
            256 => Some(TiffTag::ImageWidth),
            257 => Some(TiffTag::ImageLength),
            259 => Some(TiffTag::Compression),
            271 => Some(TiffTag::Make),
            272 => Some(TiffTag::Model),
            273 => Some(TiffTag::StripOffsets),
            274 => Some(TiffTag::Orientation),
            279 => Some(TiffTag::StripByteCounts),
            330 => Some(TiffTag::SubIfds),
            513 => Some(TiffTag::JpegInterchangeFormat),
            514 => Some(TiffTag::JpegInterchangeFormatLength),
            34665 => Some(TiffTag::ExifIfd),
            50706 => Some(TiffTag::DngVersion),
            _ => None,
        }
    }

    /// Get the numeric tag ID.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Name used in error messages.
    pub const fn name(self) -> &'static str {
        match self {
            TiffTag::NewSubfileType => "NewSubfileType",
            TiffTag::ImageWidth => "ImageWidth",
            TiffTag::ImageLength => "ImageLength",
            TiffTag::Compression => "Compression",
            TiffTag::Make => "Make",
            TiffTag::Model => "Model",
            TiffTag::StripOffsets => "StripOffsets",
            TiffTag::Orientation => "Orientation",
            TiffTag::StripByteCounts => "StripByteCounts",
            TiffTag::SubIfds => "SubIFDs",
            TiffTag::JpegInterchangeFormat => "JPEGInterchangeFormat",
            TiffTag::JpegInterchangeFormatLength => "JPEGInterchangeFormatLength",
            TiffTag::ExifIfd => "ExifIFD",
            TiffTag::DngVersion => "DNGVersion",
        }
    }
}

// =============================================================================
// Compression Values
// =============================================================================

/// TIFF compression scheme identifiers found in RAW containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum Compression {
    /// No compression
    None = 1,

    /// "Old-style" JPEG; CR2 uses it for its full-size preview strip
    OldJpeg = 6,

    /// JPEG (baseline previews, but also lossless raw data in DNG/CR2)
    Jpeg = 7,

    /// Deflate/zlib compression
    Deflate = 8,

    /// Nikon packed NEF raw data
    NikonNef = 34713,

    /// DNG lossy JPEG
    LossyJpeg = 34892,
}

impl Compression {
    /// Create a Compression from its numeric value.
    pub fn from_u16(value: u16) -> Option<Self> {
        match value {
            1 => Some(Compression::None),
            6 => Some(Compression::OldJpeg),
            7 => Some(Compression::Jpeg),
            8 => Some(Compression::Deflate),
            34713 => Some(Compression::NikonNef),
            34892 => Some(Compression::LossyJpeg),
            _ => None,
        }
    }

    /// Whether strips with this compression may hold a self-contained JPEG.
    #[inline]
    pub const fn is_jpeg(self) -> bool {
        matches!(
            self,
            Compression::OldJpeg | Compression::Jpeg | Compression::LossyJpeg
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
