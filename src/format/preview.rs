//! Embedded preview discovery.
//!
//! Cameras store one or more ready-made JPEGs next to the sensor data. This
//! module finds them without decoding any raw data:
//!
//! - **TIFF containers**: every IFD reachable through the IFD chain and the
//!   `SubIFDs` tag is inspected. A candidate is either a
//!   `JPEGInterchangeFormat`/`Length` pair or a single JPEG-compressed strip.
//! - **RAF**: the header names the preview directly.
//!
//! Candidates are tried largest first; the first one that is a JPEG the
//! decoder can handle wins. Lossless JPEG (SOF3) strips are raw sensor data in
//! CR2/DNG and are skipped.

use std::collections::{HashSet, VecDeque};

use bytes::Bytes;
use tracing::debug;

use crate::error::{FormatError, TiffError};
use crate::io::RangeReader;

use super::detect::RawFormat;
use super::raf::{RafHeader, RAF_HEADER_SIZE};
use super::tiff::{Compression, Ifd, TiffHeader, TiffTag, ValueReader};

/// Upper bound on IFDs visited per file.
const MAX_IFDS: usize = 64;

/// EXIF orientation meaning "no transform".
pub const ORIENTATION_NORMAL: u16 = 1;

// =============================================================================
// Types
// =============================================================================

/// Where a preview candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewOrigin {
    /// `JPEGInterchangeFormat` pair in some IFD
    InterchangeFormat,
    /// Single JPEG-compressed strip
    Strip,
    /// RAF header
    RafHeader,
}

/// Byte range of one embedded JPEG.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbeddedPreview {
    pub offset: u64,
    pub length: u64,
    pub origin: PreviewOrigin,
}

/// Everything preview discovery learned about a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewScan {
    /// Candidates, largest first
    pub candidates: Vec<EmbeddedPreview>,

    /// EXIF orientation from IFD0 (1 when absent)
    pub orientation: u16,
}

/// A preview that passed validation, ready for decoding.
#[derive(Debug, Clone)]
pub struct ExtractedPreview {
    pub data: Bytes,
    pub orientation: u16,
    pub origin: PreviewOrigin,
}

// =============================================================================
// Discovery
// =============================================================================

/// List embedded preview candidates of a file whose format is known.
pub async fn scan_previews<R: RangeReader>(
    reader: &R,
    format: RawFormat,
) -> Result<PreviewScan, FormatError> {
    let mut scan = if format.is_tiff_based() {
        scan_tiff(reader).await?
    } else {
        scan_raf(reader).await?
    };

    scan.candidates
        .sort_by(|a, b| b.length.cmp(&a.length).then(a.offset.cmp(&b.offset)));
    scan.candidates.dedup_by_key(|c| (c.offset, c.length));
    Ok(scan)
}

/// Return the largest decodable embedded JPEG, if any.
pub async fn extract_preview<R: RangeReader>(
    reader: &R,
    format: RawFormat,
) -> Result<Option<ExtractedPreview>, FormatError> {
    let scan = scan_previews(reader, format).await?;

    for candidate in &scan.candidates {
        let data = reader
            .read_exact_at(candidate.offset, candidate.length as usize)
            .await?;

        if is_decodable_jpeg(&data) {
            debug!(
                file = reader.identifier(),
                offset = candidate.offset,
                length = candidate.length,
                origin = ?candidate.origin,
                "Selected embedded preview"
            );
            return Ok(Some(ExtractedPreview {
                data,
                orientation: scan.orientation,
                origin: candidate.origin,
            }));
        }

        debug!(
            file = reader.identifier(),
            offset = candidate.offset,
            "Skipping embedded stream that is not a baseline/progressive JPEG"
        );
    }

    Ok(None)
}

async fn scan_raf<R: RangeReader>(reader: &R) -> Result<PreviewScan, FormatError> {
    let bytes = reader.read_at_most(0, RAF_HEADER_SIZE).await?;
    let header = RafHeader::parse(&bytes, reader.size())?;

    Ok(PreviewScan {
        candidates: vec![EmbeddedPreview {
            offset: header.jpeg_offset,
            length: header.jpeg_length,
            origin: PreviewOrigin::RafHeader,
        }],
        orientation: ORIENTATION_NORMAL,
    })
}

async fn scan_tiff<R: RangeReader>(reader: &R) -> Result<PreviewScan, FormatError> {
    let probe = reader.read_at_most(0, 16).await?;
    let header = TiffHeader::parse(&probe, reader.size())?;
    let values = ValueReader::new(reader, &header);
    let byte_order = header.byte_order;
    let file_size = reader.size();

    let mut candidates = Vec::new();
    let mut orientation = ORIENTATION_NORMAL;
    let mut visited = HashSet::new();
    let mut queue = VecDeque::from([header.first_ifd_offset]);

    while let Some(offset) = queue.pop_front() {
        if offset == 0 || !visited.insert(offset) || visited.len() > MAX_IFDS {
            continue;
        }

        let is_first = offset == header.first_ifd_offset;
        let ifd = match Ifd::read(reader, &header, offset).await {
            Ok(ifd) => ifd,
            // IFD0 must parse; a broken side chain only loses its candidates
            Err(e) if is_first => return Err(e.into()),
            Err(e) => {
                debug!(file = reader.identifier(), offset, error = %e, "Skipping unreadable IFD");
                continue;
            }
        };

        if is_first {
            orientation = ifd
                .get_u32(TiffTag::Orientation, byte_order)
                .map(|o| o as u16)
                .filter(|o| (1..=8).contains(o))
                .unwrap_or(ORIENTATION_NORMAL);
        }

        queue.push_back(ifd.next_ifd_offset);
        if let Some(entry) = ifd.get_entry_by_tag(TiffTag::SubIfds) {
            match values.read_u32_array(entry).await {
                Ok(children) => queue.extend(children.into_iter().map(u64::from)),
                Err(e) => debug!(file = reader.identifier(), error = %e, "Unreadable SubIFDs"),
            }
        }

        match candidate_from_ifd(&ifd, &values, file_size).await {
            Ok(Some(candidate)) => candidates.push(candidate),
            Ok(None) => {}
            Err(e) => {
                debug!(
                    file = reader.identifier(),
                    offset,
                    error = %e,
                    "Ignoring malformed preview tags"
                )
            }
        }
    }

    Ok(PreviewScan {
        candidates,
        orientation,
    })
}

/// Extract the preview candidate an IFD points at, if it holds one.
async fn candidate_from_ifd<R: RangeReader>(
    ifd: &Ifd,
    values: &ValueReader<'_, R>,
    file_size: u64,
) -> Result<Option<EmbeddedPreview>, TiffError> {
    let in_file = |offset: u64, length: u64| length > 0 && offset + length <= file_size;

    if let (Some(offset), Some(length)) = (
        ifd.get_entry_by_tag(TiffTag::JpegInterchangeFormat),
        ifd.get_entry_by_tag(TiffTag::JpegInterchangeFormatLength),
    ) {
        let offset = values.read_u32(offset).await? as u64;
        let length = values.read_u32(length).await? as u64;
        if in_file(offset, length) {
            return Ok(Some(EmbeddedPreview {
                offset,
                length,
                origin: PreviewOrigin::InterchangeFormat,
            }));
        }
    }

    let is_jpeg = ifd
        .get_u32(TiffTag::Compression, values.byte_order())
        .and_then(|c| Compression::from_u16(c as u16))
        .is_some_and(|c| c.is_jpeg());
    if !is_jpeg {
        return Ok(None);
    }

    let (Some(offsets), Some(counts)) = (
        ifd.get_entry_by_tag(TiffTag::StripOffsets),
        ifd.get_entry_by_tag(TiffTag::StripByteCounts),
    ) else {
        return Ok(None);
    };

    // Multi-strip JPEG is raw sensor data, never a preview
    if offsets.count != 1 || counts.count != 1 {
        return Ok(None);
    }

    let offset = values.read_u32(offsets).await? as u64;
    let length = values.read_u32(counts).await? as u64;
    Ok(in_file(offset, length).then_some(EmbeddedPreview {
        offset,
        length,
        origin: PreviewOrigin::Strip,
    }))
}

// =============================================================================
// JPEG validation
// =============================================================================

/// Whether `data` is a JPEG the image decoder can handle.
///
/// Walks marker segments up to the first start-of-frame and accepts
/// baseline (SOF0), extended (SOF1) and progressive (SOF2) frames.
pub fn is_decodable_jpeg(data: &[u8]) -> bool {
    matches!(jpeg_frame_marker(data), Some(0xC0..=0xC2))
}

/// Marker byte of the first SOF segment, `None` if there is none.
fn jpeg_frame_marker(data: &[u8]) -> Option<u8> {
    if !data.starts_with(&[0xFF, 0xD8]) {
        return None;
    }

    let mut pos = 2;
    while pos + 1 < data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        pos += 2;

        match marker {
            // Fill byte before the real marker
            0xFF => pos -= 1,
            // Standalone markers carry no length
            0x01 | 0xD0..=0xD7 => {}
            0xC0..=0xCF if !matches!(marker, 0xC4 | 0xC8 | 0xCC) => return Some(marker),
            0xD9 | 0xDA => return None,
            _ => {
                if pos + 2 > data.len() {
                    return None;
                }
                let length = u16::from_be_bytes([data[pos], data[pos + 1]]) as usize;
                if length < 2 {
                    return None;
                }
                pos += length;
            }
        }
    }

    None
}

// =============================================================================
// Tests
// =============================================================================
