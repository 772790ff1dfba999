//! Container parsers for camera RAW files.
//!
//! Nothing here decodes sensor data. The parsers only go as far as needed to
//! identify the container and locate the JPEG previews cameras embed.
//!
//! # Format Detection
//!
//! Use [`detect::detect_format`] to identify a file. Supported containers:
//!
//! - **TIFF-based**: NEF, CR2, DNG, 3FR, ORF, RW2 and plain TIFF
//! - **RAF**: Fujifilm's own header format
//!
//! # Preview Discovery
//!
//! [`preview::extract_preview`] returns the largest embedded JPEG the image
//! decoder can handle, together with the EXIF orientation of the file.

pub mod detect;
pub mod preview;
pub mod raf;
pub mod tiff;

pub use detect::{detect_format, is_tiff_header, RawFormat};
pub use preview::{
    extract_preview, is_decodable_jpeg, scan_previews, EmbeddedPreview, ExtractedPreview,
    PreviewOrigin, PreviewScan,
};
pub use raf::RafHeader;
