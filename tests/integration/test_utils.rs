//! Test utilities for integration tests.
//!
//! This module provides a counting mock fetcher and builders for synthetic
//! RAW containers (NEF, DNG, RAF and plain TIFF) with embedded JPEG previews.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use tokio::sync::RwLock;

use raw_preview_check::error::FetchError;
use raw_preview_check::fixture::digest::sha1_hex;
use raw_preview_check::fixture::{Fetcher, FixtureAsset};

// =============================================================================
// Mock Fetcher with Request Tracking
// =============================================================================

/// A fetcher serving pre-configured bodies by URL.
///
/// Unknown URLs fail like an unreachable host. Every request is counted and
/// recorded, so tests can assert on network access.
#[derive(Clone, Default)]
pub struct MockFetcher {
    bodies: HashMap<String, Bytes>,
    request_count: Arc<AtomicUsize>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `data` at `url` (as the fetcher will receive it, i.e. encoded).
    pub fn with_body(mut self, url: impl Into<String>, data: Vec<u8>) -> Self {
        self.bodies.insert(url.into(), Bytes::from(data));
        self
    }

    /// Serve the content of each `(asset, data)` pair at the asset's URL.
    pub fn serving(assets: &[(FixtureAsset, Vec<u8>)]) -> Self {
        assets.iter().fold(Self::new(), |fetcher, (asset, data)| {
            fetcher.with_body(asset.fetch_url(), data.clone())
        })
    }

    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::SeqCst)
    }

    pub async fn requests(&self) -> Vec<String> {
        self.requests.read().await.clone()
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        self.request_count.fetch_add(1, Ordering::SeqCst);
        self.requests.write().await.push(url.to_string());

        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Request {
                url: url.to_string(),
                message: "connection refused".to_string(),
            })
    }
}

// =============================================================================
// Fixture Helpers
// =============================================================================

/// Asset whose expected SHA-1 is that of `data`.
pub fn asset_for(file_name: &str, data: &[u8]) -> FixtureAsset {
    let url = format!("https://fixtures.test/data/Test Camera/{}", file_name);
    FixtureAsset::new(url, file_name, sha1_hex(data)).unwrap()
}

// =============================================================================
// Test JPEG Creation
// =============================================================================

/// Create a test RGB JPEG image with a gradient pattern.
pub fn create_test_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x % 256) as u8;
        let g = (y % 256) as u8;
        let b = ((x + y) % 256) as u8;
        Rgb([r, g, b])
    });

    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, 90);
    encoder.encode_image(&img).unwrap();
    buf
}

/// A stream that looks like a baseline JPEG but does not decode.
pub fn create_corrupt_jpeg() -> Vec<u8> {
    let mut data = vec![0xFF, 0xD8, 0xFF, 0xC0, 0x00, 0x04, 0x08, 0x00];
    data.extend(std::iter::repeat(0x5A).take(64));
    data.extend_from_slice(&[0xFF, 0xD9]);
    data
}

/// Create an uncompressed RGB TIFF raster using the image crate.
pub fn create_raster_tiff(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 200]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, ImageFormat::Tiff)
        .unwrap();
    buf.into_inner()
}

/// Check if data is a decodable JPEG.
pub fn is_valid_jpeg(data: &[u8]) -> bool {
    data.starts_with(&[0xFF, 0xD8])
        && image::load_from_memory_with_format(data, ImageFormat::Jpeg).is_ok()
}

// =============================================================================
// TIFF File Builder
// =============================================================================

#[derive(Clone, Copy)]
pub enum ByteOrderType {
    LittleEndian,
    BigEndian,
}

/// Value of one IFD entry.
#[derive(Clone)]
pub enum Value {
    Short(u16),
    Long(u32),
    Ascii(String),
    /// Four raw bytes, type BYTE (e.g. `DNGVersion`)
    Bytes4([u8; 4]),
    /// Offset of the sub IFD with this index (type LONG)
    SubIfd(usize),
    /// Offset of the payload with this index (type LONG)
    PayloadOffset(usize),
    /// Length of the payload with this index (type LONG)
    PayloadLength(usize),
}

/// Builder for TIFF containers: IFD0, optional sub IFDs reachable through
/// `SubIFDs`, out-of-line strings and opaque payloads.
pub struct TiffBuilder {
    byte_order: ByteOrderType,
    cr2_marker: bool,
    ifd0: Vec<(u16, Value)>,
    sub_ifds: Vec<Vec<(u16, Value)>>,
    payloads: Vec<Vec<u8>>,
}

impl TiffBuilder {
    pub fn new() -> Self {
        Self {
            byte_order: ByteOrderType::LittleEndian,
            cr2_marker: false,
            ifd0: Vec::new(),
            sub_ifds: Vec::new(),
            payloads: Vec::new(),
        }
    }

    pub fn with_byte_order(mut self, order: ByteOrderType) -> Self {
        self.byte_order = order;
        self
    }

    /// Extend the header with Canon's `CR` marker (16-byte CR2 header).
    pub fn with_cr2_marker(mut self) -> Self {
        self.cr2_marker = true;
        self
    }

    pub fn entry(mut self, tag: u16, value: Value) -> Self {
        self.ifd0.push((tag, value));
        self
    }

    pub fn sub_ifd(mut self, entries: Vec<(u16, Value)>) -> Self {
        self.sub_ifds.push(entries);
        self
    }

    pub fn payload(mut self, data: Vec<u8>) -> Self {
        self.payloads.push(data);
        self
    }

    /// Build the TIFF file data.
    pub fn build(self) -> Vec<u8> {
        let ifds: Vec<&Vec<(u16, Value)>> =
            std::iter::once(&self.ifd0).chain(self.sub_ifds.iter()).collect();

        let header_len = if self.cr2_marker { 16u32 } else { 8u32 };

        // IFDs follow the header back to back
        let mut offset = header_len;
        let mut ifd_offsets = Vec::new();
        for ifd in &ifds {
            ifd_offsets.push(offset);
            offset += (2 + ifd.len() * 12 + 4) as u32;
        }

        // Then out-of-line strings, then payloads
        let strings_start = offset;
        let strings_size: u32 = ifds
            .iter()
            .flat_map(|ifd| ifd.iter())
            .filter_map(|(_, v)| match v {
                Value::Ascii(s) if s.len() + 1 > 4 => Some(s.len() as u32 + 1),
                _ => None,
            })
            .sum();

        let mut payload_offsets = Vec::new();
        let mut payload_offset = strings_start + strings_size;
        for payload in &self.payloads {
            payload_offsets.push(payload_offset);
            payload_offset += payload.len() as u32;
        }

        let mut data = Vec::new();
        match self.byte_order {
            ByteOrderType::LittleEndian => data.extend_from_slice(b"II"),
            ByteOrderType::BigEndian => data.extend_from_slice(b"MM"),
        }
        self.write_u16(&mut data, 42);
        self.write_u32(&mut data, header_len);
        if self.cr2_marker {
            // Marker, version 2.0, then the (absent) raw IFD offset
            data.extend_from_slice(b"CR");
            data.extend_from_slice(&[2, 0]);
            self.write_u32(&mut data, 0);
        }

        let mut strings = Vec::new();
        for ifd in &ifds {
            self.write_u16(&mut data, ifd.len() as u16);
            for (tag, value) in ifd.iter() {
                self.write_u16(&mut data, *tag);
                match value {
                    Value::Short(v) => {
                        self.write_u16(&mut data, 3);
                        self.write_u32(&mut data, 1);
                        self.write_u16(&mut data, *v);
                        self.write_u16(&mut data, 0);
                    }
                    Value::Long(v) => self.write_long(&mut data, *v),
                    Value::SubIfd(i) => self.write_long(&mut data, ifd_offsets[i + 1]),
                    Value::PayloadOffset(i) => self.write_long(&mut data, payload_offsets[*i]),
                    Value::PayloadLength(i) => {
                        self.write_long(&mut data, self.payloads[*i].len() as u32)
                    }
                    Value::Bytes4(bytes) => {
                        self.write_u16(&mut data, 1);
                        self.write_u32(&mut data, 4);
                        data.extend_from_slice(bytes);
                    }
                    Value::Ascii(s) => {
                        let mut bytes = s.as_bytes().to_vec();
                        bytes.push(0);
                        self.write_u16(&mut data, 2);
                        self.write_u32(&mut data, bytes.len() as u32);
                        if bytes.len() <= 4 {
                            bytes.resize(4, 0);
                            data.extend_from_slice(&bytes);
                        } else {
                            self.write_u32(&mut data, strings_start + strings.len() as u32);
                            strings.extend_from_slice(&bytes);
                        }
                    }
                }
            }
            self.write_u32(&mut data, 0);
        }

        data.extend_from_slice(&strings);
        for payload in &self.payloads {
            data.extend_from_slice(payload);
        }
        data
    }

    fn write_long(&self, data: &mut Vec<u8>, value: u32) {
        self.write_u16(data, 4);
        self.write_u32(data, 1);
        self.write_u32(data, value);
    }

    fn write_u16(&self, data: &mut Vec<u8>, value: u16) {
        match self.byte_order {
            ByteOrderType::LittleEndian => data.extend(&value.to_le_bytes()),
            ByteOrderType::BigEndian => data.extend(&value.to_be_bytes()),
        }
    }

    fn write_u32(&self, data: &mut Vec<u8>, value: u32) {
        match self.byte_order {
            ByteOrderType::LittleEndian => data.extend(&value.to_le_bytes()),
            ByteOrderType::BigEndian => data.extend(&value.to_be_bytes()),
        }
    }
}

impl Default for TiffBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// RAW Container Builders
// =============================================================================

/// Tag numbers used by the builders.
pub mod tags {
    pub const NEW_SUBFILE_TYPE: u16 = 254;
    pub const COMPRESSION: u16 = 259;
    pub const MAKE: u16 = 271;
    pub const STRIP_OFFSETS: u16 = 273;
    pub const ORIENTATION: u16 = 274;
    pub const STRIP_BYTE_COUNTS: u16 = 279;
    pub const SUB_IFDS: u16 = 330;
    pub const JPEG_INTERCHANGE_FORMAT: u16 = 513;
    pub const JPEG_INTERCHANGE_FORMAT_LENGTH: u16 = 514;
    pub const DNG_VERSION: u16 = 50706;
}

/// NEF-like file: big-endian, Nikon `Make`, preview in a sub IFD.
pub fn create_nef(preview: Vec<u8>, orientation: u16) -> Vec<u8> {
    TiffBuilder::new()
        .with_byte_order(ByteOrderType::BigEndian)
        .entry(tags::MAKE, Value::Ascii("NIKON CORPORATION".to_string()))
        .entry(tags::ORIENTATION, Value::Short(orientation))
        .entry(tags::SUB_IFDS, Value::SubIfd(0))
        .sub_ifd(vec![
            (tags::NEW_SUBFILE_TYPE, Value::Long(1)),
            (tags::COMPRESSION, Value::Short(6)),
            (tags::JPEG_INTERCHANGE_FORMAT, Value::PayloadOffset(0)),
            (tags::JPEG_INTERCHANGE_FORMAT_LENGTH, Value::PayloadLength(0)),
        ])
        .payload(preview)
        .build()
}

/// CR2-like file: `CR` header marker, preview as a JPEG strip in IFD0.
pub fn create_cr2(preview: Vec<u8>, orientation: u16) -> Vec<u8> {
    TiffBuilder::new()
        .with_cr2_marker()
        .entry(tags::COMPRESSION, Value::Short(6))
        .entry(tags::MAKE, Value::Ascii("Canon".to_string()))
        .entry(tags::STRIP_OFFSETS, Value::PayloadOffset(0))
        .entry(tags::ORIENTATION, Value::Short(orientation))
        .entry(tags::STRIP_BYTE_COUNTS, Value::PayloadLength(0))
        .payload(preview)
        .build()
}

/// 3FR-like file: Hasselblad `Make`, preview via `JPEGInterchangeFormat` in IFD0.
pub fn create_3fr(preview: Vec<u8>) -> Vec<u8> {
    TiffBuilder::new()
        .entry(tags::COMPRESSION, Value::Short(6))
        .entry(tags::MAKE, Value::Ascii("Hasselblad".to_string()))
        .entry(tags::JPEG_INTERCHANGE_FORMAT, Value::PayloadOffset(0))
        .entry(tags::JPEG_INTERCHANGE_FORMAT_LENGTH, Value::PayloadLength(0))
        .payload(preview)
        .build()
}

/// NEF-like file without any embedded JPEG.
pub fn create_nef_without_preview() -> Vec<u8> {
    TiffBuilder::new()
        .entry(tags::MAKE, Value::Ascii("NIKON CORPORATION".to_string()))
        .entry(tags::COMPRESSION, Value::Short(34713))
        .build()
}

/// DNG-like file: `DNGVersion` in IFD0, preview as a JPEG strip.
pub fn create_dng(preview: Vec<u8>) -> Vec<u8> {
    TiffBuilder::new()
        .entry(tags::NEW_SUBFILE_TYPE, Value::Long(1))
        .entry(tags::COMPRESSION, Value::Short(7))
        .entry(tags::MAKE, Value::Ascii("Canon".to_string()))
        .entry(tags::STRIP_OFFSETS, Value::PayloadOffset(0))
        .entry(tags::STRIP_BYTE_COUNTS, Value::PayloadLength(0))
        .entry(tags::DNG_VERSION, Value::Bytes4([1, 4, 0, 0]))
        .payload(preview)
        .build()
}

/// Fujifilm RAF with its preview right after the header.
pub fn create_raf(preview: Vec<u8>) -> Vec<u8> {
    let mut data = b"FUJIFILMCCD-RAW ".to_vec();
    data.resize(92, 0);
    data[84..88].copy_from_slice(&92u32.to_be_bytes());
    data[88..92].copy_from_slice(&(preview.len() as u32).to_be_bytes());
    data.extend_from_slice(&preview);
    data
}
