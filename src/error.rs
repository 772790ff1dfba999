use thiserror::Error;

/// I/O errors that can occur when reading byte ranges
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Requested range exceeds resource bounds
    #[error("Range out of bounds: requested {requested} bytes at offset {offset}, size is {size}")]
    RangeOutOfBounds {
        offset: u64,
        requested: u64,
        size: u64,
    },

    /// Underlying read failed
    #[error("Read error: {0}")]
    Read(String),
}

/// Errors that can occur when parsing TIFF containers
#[derive(Debug, Clone, Error)]
pub enum TiffError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Invalid TIFF magic bytes (not II or MM)
    #[error("Invalid TIFF magic bytes: expected 0x4949 (II) or 0x4D4D (MM), got 0x{0:04X}")]
    InvalidMagic(u16),

    /// Version word is not one used by TIFF-based RAW containers
    #[error("Invalid TIFF version: 0x{0:04X}")]
    InvalidVersion(u16),

    /// File is too small to contain a valid TIFF header
    #[error("File too small: need at least {required} bytes, got {actual}")]
    FileTooSmall { required: u64, actual: u64 },

    /// Invalid IFD offset (points outside file or to invalid location)
    #[error("Invalid IFD offset: {0}")]
    InvalidIfdOffset(u64),

    /// Tag has unexpected type or count
    #[error("Invalid tag value for {tag}: {message}")]
    InvalidTagValue { tag: &'static str, message: String },

    /// Unknown field type in IFD entry
    #[error("Unknown field type: {0}")]
    UnknownFieldType(u16),
}

/// Errors related to RAW format detection and preview discovery
#[derive(Debug, Clone, Error)]
pub enum FormatError {
    /// I/O error while reading the file
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// TIFF parsing error
    #[error("TIFF error: {0}")]
    Tiff(#[from] TiffError),

    /// File is not a recognized RAW container
    #[error("Unsupported format: {reason}")]
    UnsupportedFormat { reason: String },

    /// RAF header is present but inconsistent
    #[error("Invalid RAF header: {0}")]
    InvalidRaf(String),
}

/// Errors raised while fetching fixture bytes from the remote archive
#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("Request to {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read body from {url}: {message}")]
    Body { url: String, message: String },
}

/// Errors raised by the fixture cache
#[derive(Debug, Clone, Error)]
pub enum FixtureError {
    /// Asset definition is malformed
    #[error("Invalid fixture asset {file_name:?}: {reason}")]
    InvalidAsset { file_name: String, reason: String },

    /// Manifest could not be read or parsed
    #[error("Failed to load manifest {path}: {message}")]
    Manifest { path: String, message: String },

    #[error("Failed to create cache directory {path}: {message}")]
    CacheDir { path: String, message: String },

    #[error("Failed to write cached fixture {path}: {message}")]
    Write { path: String, message: String },

    #[error("Failed to remove stale fixture {path}: {message}")]
    Remove { path: String, message: String },

    /// Cached fixture does not exist (download failed or digest mismatched)
    #[error("Fixture not found in cache: {path}")]
    Missing { path: String },

    #[error("Failed to read cached fixture {path}: {message}")]
    Read { path: String, message: String },

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),
}

/// Errors raised by file store implementations
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No file with this name in the user's folder
    #[error("File not found: {owner}/{name}")]
    NotFound { owner: String, name: String },

    #[error("File already exists: {owner}/{name}")]
    AlreadyExists { owner: String, name: String },

    #[error("Invalid file name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("Storage I/O error: {0}")]
    Io(String),
}

impl StoreError {
    /// Whether this error is the distinguishable "not found" condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Errors raised by the preview service.
///
/// "No preview available" is not an error; it is reported as
/// [`PreviewOutcome::NotFound`](crate::preview::PreviewOutcome::NotFound).
#[derive(Debug, Clone, Error)]
pub enum PreviewError {
    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid preview dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Failed to encode preview: {message}")]
    Encode { message: String },
}

/// Errors that abort a conversion check run
#[derive(Debug, Clone, Error)]
pub enum CheckError {
    #[error(transparent)]
    Fixture(#[from] FixtureError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Preview(#[from] PreviewError),
}
