//! Byte-range access to file content.
//!
//! Container parsers only ever ask for `(offset, len)` windows, so they work
//! the same whether the bytes come from the file store or a local cache file.

mod memory;
mod range_reader;

pub use memory::MemoryReader;
pub use range_reader::RangeReader;
