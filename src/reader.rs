//! Source readers - decode one snapshot file into a flat sample buffer
//!
//! The assembler only ever talks to the [`SourceReader`] trait. Vendor formats
//! plug in by implementing it; [`RawReader`] covers headerless little-endian
//! `f32` volumes.

use crate::compression::CompressionMethod;
use crate::error::{Result, VdfError};
use crate::utils::le_bytes_into_samples;
use std::fs;
use std::path::Path;

/// Capability to decode one source file into a uniform sample buffer
pub trait SourceReader {
    /// Decode `path` as timestep `timestep` into `buffer`, replacing its contents.
    ///
    /// Samples must come out in voxel order; the assembler checks the length.
    fn read_file(&mut self, path: &Path, timestep: u32, buffer: &mut Vec<f32>) -> Result<()>;

    /// Whether the last call to [`read_file`](Self::read_file) succeeded
    fn has_read(&self) -> bool;

    /// Whether a file found in the source folder belongs to this reader
    fn accepts(&self, _path: &Path) -> bool {
        true
    }
}

impl<R: SourceReader + ?Sized> SourceReader for Box<R> {
    fn read_file(&mut self, path: &Path, timestep: u32, buffer: &mut Vec<f32>) -> Result<()> {
        (**self).read_file(path, timestep, buffer)
    }

    fn has_read(&self) -> bool {
        (**self).has_read()
    }

    fn accepts(&self, path: &Path) -> bool {
        (**self).accepts(path)
    }
}

/// Reader for raw little-endian `f32` volumes.
///
/// Accepts `*.raw`, `*.raw.deflate` and `*.raw.zst`.
#[derive(Debug, Default)]
pub struct RawReader {
    has_read: bool,
    compression: Option<CompressionMethod>,
}

impl RawReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Force a compression method instead of detecting it from the extension
    pub fn with_compression(mut self, method: CompressionMethod) -> Self {
        self.compression = Some(method);
        self
    }

    fn decode(&self, path: &Path, buffer: &mut Vec<f32>) -> Result<()> {
        let method = self
            .compression
            .unwrap_or_else(|| CompressionMethod::from_path(path));
        let bytes = method.decompress(fs::read(path)?)?;
        le_bytes_into_samples(&bytes, buffer)
    }
}

impl SourceReader for RawReader {
    fn read_file(&mut self, path: &Path, timestep: u32, buffer: &mut Vec<f32>) -> Result<()> {
        self.has_read = false;
        self.decode(path, buffer).map_err(|e| VdfError::Ingestion {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        log::debug!(
            "decoded {} as timestep {} ({} samples)",
            path.display(),
            timestep,
            buffer.len()
        );
        self.has_read = true;
        Ok(())
    }

    fn has_read(&self) -> bool {
        self.has_read
    }

    fn accepts(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        name.ends_with(".raw") || name.ends_with(".raw.deflate") || name.ends_with(".raw.zst")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::samples_to_le_bytes;
    use flate2::write::DeflateEncoder;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_accepts_raw_extensions() {
        let reader = RawReader::new();
        assert!(reader.accepts(Path::new("a/t0.raw")));
        assert!(reader.accepts(Path::new("t0.raw.deflate")));
        assert!(reader.accepts(Path::new("t0.raw.zst")));
        assert!(!reader.accepts(Path::new("t0.cdf")));
        assert!(!reader.accepts(Path::new("notes.txt")));
    }

    #[test]
    fn test_read_plain_raw() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t0.raw");
        fs::write(&path, samples_to_le_bytes(&[1.0, 2.0, 3.0, 4.0])).unwrap();

        let mut reader = RawReader::new();
        assert!(!reader.has_read());

        let mut buffer = Vec::new();
        reader.read_file(&path, 0, &mut buffer).unwrap();
        assert!(reader.has_read());
        assert_eq!(buffer, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_read_compressed_raw() {
        let temp_dir = TempDir::new().unwrap();
        let samples: Vec<f32> = (0..64).map(|i| i as f32).collect();
        let raw = samples_to_le_bytes(&samples);

        for method in [CompressionMethod::Deflate, CompressionMethod::Zstd] {
            let name = format!("t0.raw.{}", method.extension().unwrap());
            let path = temp_dir.path().join(name);
            let compressed = match method {
                CompressionMethod::Deflate => {
                    let mut encoder = DeflateEncoder::new(Vec::new(), flate2::Compression::fast());
                    encoder.write_all(&raw).unwrap();
                    encoder.finish().unwrap()
                }
                _ => zstd::encode_all(raw.as_slice(), 1).unwrap(),
            };
            fs::write(&path, compressed).unwrap();

            let mut reader = RawReader::new();
            let mut buffer = Vec::new();
            reader.read_file(&path, 0, &mut buffer).unwrap();
            assert_eq!(buffer, samples);
        }
    }

    #[test]
    fn test_forced_compression_overrides_extension() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("t0.raw");
        let raw = samples_to_le_bytes(&[7.0, 8.0]);
        fs::write(&path, zstd::encode_all(raw.as_slice(), 1).unwrap()).unwrap();

        let mut buffer = Vec::new();
        let mut reader = RawReader::new().with_compression(CompressionMethod::Zstd);
        reader.read_file(&path, 0, &mut buffer).unwrap();
        assert_eq!(buffer, vec![7.0, 8.0]);
    }

    #[test]
    fn test_failed_read_clears_has_read() {
        let temp_dir = TempDir::new().unwrap();
        let good = temp_dir.path().join("good.raw");
        let bad = temp_dir.path().join("bad.raw");
        fs::write(&good, samples_to_le_bytes(&[1.0])).unwrap();
        fs::write(&bad, [0u8; 5]).unwrap();

        let mut reader = RawReader::new();
        let mut buffer = Vec::new();
        reader.read_file(&good, 0, &mut buffer).unwrap();
        assert!(reader.has_read());

        let err = reader.read_file(&bad, 1, &mut buffer).unwrap_err();
        assert!(matches!(err, VdfError::Ingestion { .. }));
        assert!(!reader.has_read());
    }
}
