//! Error types for VDF assembly

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for VDF operations
#[derive(Error, Debug)]
pub enum VdfError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Temp file error at {}: {source}", path.display())]
    TempFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid VDF format: {0}")]
    InvalidFormat(String),

    #[error("Invalid dimensions: {0}")]
    InvalidDimensions(String),

    #[error("Unsupported grid type: {0}")]
    InvalidGridType(u32),

    #[error("Failed to ingest {}: {reason}", path.display())]
    Ingestion { path: PathBuf, reason: String },

    #[error("No timesteps were read from {}", .0.display())]
    NoTimesteps(PathBuf),

    #[error("Consistency error: {0}")]
    Consistency(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl VdfError {
    /// Wrap an I/O error with the temp file it happened on
    pub fn temp_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        VdfError::TempFile {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised by configuration checks, before any I/O
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            VdfError::InvalidDimensions(_) | VdfError::InvalidGridType(_) | VdfError::Configuration(_)
        )
    }
}

/// Specialized Result type for VDF operations
pub type Result<T> = std::result::Result<T, VdfError>;

impl From<bincode::Error> for VdfError {
    fn from(err: bincode::Error) -> Self {
        VdfError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for VdfError {
    fn from(err: serde_json::Error) -> Self {
        VdfError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_classification() {
        assert!(VdfError::InvalidGridType(7).is_configuration());
        assert!(VdfError::InvalidDimensions("x is zero".into()).is_configuration());
        assert!(!VdfError::Consistency("short block".into()).is_configuration());
    }

    #[test]
    fn test_temp_file_message_names_path() {
        let err = VdfError::temp_file(
            "/tmp/out/timestep_3.tmp",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        let msg = err.to_string();
        assert!(msg.contains("timestep_3.tmp"));
        assert!(msg.contains("gone"));
    }
}
