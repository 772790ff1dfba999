//! TIFF container parsing for camera RAW files.
//!
//! Most RAW formats (NEF, CR2, DNG, 3FR, and plain TIFF) are TIFF containers
//! with vendor quirks. Only the structure needed to find embedded previews is
//! parsed here; sensor data is never touched.
//!
//! # Key Concepts
//!
//! - **Byte order**: TIFF files declare their endianness (II = little-endian,
//!   MM = big-endian) in the header. All multi-byte values must be read
//!   respecting this order.
//!
//! - **Header variants**: Olympus and Panasonic replace the version word 42
//!   with their own magic; Canon CR2 appends a `CR` marker after the header.
//!
//! - **IFD (Image File Directory)**: Each IFD describes one image. RAW files
//!   chain several of them (thumbnail, preview, raw data) and hang more off
//!   the `SubIFDs` tag.
//!
//! - **Inline vs offset values**: Values of four bytes or fewer are stored in
//!   the IFD entry itself; larger values live at the offset the entry holds.

mod parser;
mod tags;
mod values;

pub use parser::{ByteOrder, HeaderVariant, Ifd, IfdEntry, TiffHeader, TIFF_HEADER_SIZE};
pub use tags::{Compression, FieldType, TiffTag};
pub use values::ValueReader;
