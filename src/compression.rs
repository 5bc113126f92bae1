//! Compressed raw source volumes
//!
//! Raw snapshots are often shipped compressed. The method is picked from the
//! outermost file extension: `.deflate` for raw deflate streams, `.zst` for
//! Zstandard, anything else is read as-is.

use crate::error::{Result, VdfError};
use flate2::read::DeflateDecoder;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Compression methods understood for source files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionMethod {
    /// Stored as-is
    None,
    /// Raw deflate stream
    Deflate,
    /// Zstandard frame
    Zstd,
}

impl CompressionMethod {
    /// Detect the method from a file's outermost extension
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("deflate") => CompressionMethod::Deflate,
            Some("zst") => CompressionMethod::Zstd,
            _ => CompressionMethod::None,
        }
    }

    /// Extension appended to compressed files, if any
    pub fn extension(&self) -> Option<&'static str> {
        match self {
            CompressionMethod::None => None,
            CompressionMethod::Deflate => Some("deflate"),
            CompressionMethod::Zstd => Some("zst"),
        }
    }

    /// Unpack the contents of a source file stored with this method
    pub fn decompress(&self, data: Vec<u8>) -> Result<Vec<u8>> {
        match self {
            CompressionMethod::None => Ok(data),
            CompressionMethod::Deflate => {
                let mut unpacked = Vec::with_capacity(data.len() * 2);
                DeflateDecoder::new(data.as_slice())
                    .read_to_end(&mut unpacked)
                    .map_err(|e| VdfError::Decompression(format!("deflate: {}", e)))?;
                Ok(unpacked)
            }
            CompressionMethod::Zstd => zstd::decode_all(data.as_slice())
                .map_err(|e| VdfError::Decompression(format!("zstd: {}", e))),
        }
    }
}
