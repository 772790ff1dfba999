//! Format detection for camera RAW files.
//!
//! Detection looks at magic bytes first and only then at vendor markers:
//!
//! - **RAF**: `FUJIFILMCCD-RAW` magic
//! - **CR2 / ORF / RW2**: announced by the TIFF header itself
//! - **DNG**: `DNGVersion` tag in IFD0
//! - **NEF / 3FR**: `Make` string in IFD0
//! - anything else that parses as TIFF is treated as a plain TIFF
//!
//! Files that are neither TIFF nor RAF are unsupported; the preview service
//! turns that into "no preview available".

use tracing::debug;

use crate::error::FormatError;
use crate::io::RangeReader;

use super::raf::{is_raf_header, RAF_MAGIC};
use super::tiff::{HeaderVariant, Ifd, TiffHeader, TiffTag, ValueReader, TIFF_HEADER_SIZE};

// =============================================================================
// RawFormat
// =============================================================================

/// Detected RAW container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawFormat {
    /// Nikon NEF
    Nef,
    /// Canon CR2
    Cr2,
    /// Adobe Digital Negative
    Dng,
    /// Fujifilm RAF
    Raf,
    /// Hasselblad 3FR
    Hasselblad3fr,
    /// Olympus ORF
    Orf,
    /// Panasonic RW2
    Rw2,
    /// TIFF without vendor markers (e.g. early Canon DCS TIF)
    Tiff,
}

impl RawFormat {
    /// Get a human-readable name for the format.
    pub const fn name(&self) -> &'static str {
        match self {
            RawFormat::Nef => "Nikon NEF",
            RawFormat::Cr2 => "Canon CR2",
            RawFormat::Dng => "Adobe DNG",
            RawFormat::Raf => "Fujifilm RAF",
            RawFormat::Hasselblad3fr => "Hasselblad 3FR",
            RawFormat::Orf => "Olympus ORF",
            RawFormat::Rw2 => "Panasonic RW2",
            RawFormat::Tiff => "TIFF",
        }
    }

    /// Whether the file is a TIFF container.
    pub const fn is_tiff_based(&self) -> bool {
        !matches!(self, RawFormat::Raf)
    }
}

// =============================================================================
// Format Detection
// =============================================================================

/// Bytes read up front: enough for the RAF magic and the CR2 marker.
const PROBE_BYTES: usize = 16;

/// Detect the RAW format of a file.
///
/// # Returns
/// * `Ok(RawFormat)` - The detected format
/// * `Err(FormatError::UnsupportedFormat)` - Neither TIFF nor RAF
/// * `Err(FormatError::Tiff)` - TIFF header found but IFD0 is corrupt
pub async fn detect_format<R: RangeReader>(reader: &R) -> Result<RawFormat, FormatError> {
    if reader.size() < TIFF_HEADER_SIZE as u64 {
        return Err(FormatError::UnsupportedFormat {
            reason: format!("file too small ({} bytes)", reader.size()),
        });
    }

    let probe = reader.read_at_most(0, PROBE_BYTES).await?;

    if probe.len() >= RAF_MAGIC.len() && is_raf_header(&probe) {
        return Ok(RawFormat::Raf);
    }

    if !is_tiff_header(&probe) {
        return Err(FormatError::UnsupportedFormat {
            reason: "not a TIFF or RAF container".to_string(),
        });
    }

    let header = TiffHeader::parse(&probe, reader.size())?;
    let format = match header.variant {
        HeaderVariant::CanonCr2 => RawFormat::Cr2,
        HeaderVariant::Olympus => RawFormat::Orf,
        HeaderVariant::Panasonic => RawFormat::Rw2,
        HeaderVariant::Standard => detect_from_first_ifd(reader, &header).await?,
    };

    debug!(file = reader.identifier(), format = format.name(), "Detected RAW format");
    Ok(format)
}

/// Classify a standard TIFF by the tags of its first IFD.
async fn detect_from_first_ifd<R: RangeReader>(
    reader: &R,
    header: &TiffHeader,
) -> Result<RawFormat, FormatError> {
    let ifd = Ifd::read(reader, header, header.first_ifd_offset).await?;

    if ifd.get_entry_by_tag(TiffTag::DngVersion).is_some() {
        return Ok(RawFormat::Dng);
    }

    let make = match ifd.get_entry_by_tag(TiffTag::Make) {
        Some(entry) => ValueReader::new(reader, header)
            .read_string(entry)
            .await
            .unwrap_or_default(),
        None => String::new(),
    };

    Ok(classify_make(&make))
}

/// Map a `Make` string to the vendor format it implies.
fn classify_make(make: &str) -> RawFormat {
    let make = make.to_ascii_lowercase();
    if make.starts_with("nikon") {
        RawFormat::Nef
    } else if make.starts_with("hasselblad") {
        RawFormat::Hasselblad3fr
    } else {
        RawFormat::Tiff
    }
}

/// Check if bytes start with a TIFF header understood by the parser.
pub fn is_tiff_header(bytes: &[u8]) -> bool {
    if bytes.len() < TIFF_HEADER_SIZE {
        return false;
    }
    matches!(&bytes[0..2], b"II" | b"MM")
        && TiffHeader::parse(bytes, u64::MAX).is_ok()
}

// =============================================================================
// Tests
// =============================================================================
