//! Assembler configuration, loadable from JSON

use crate::compression::CompressionMethod;
use crate::error::{Result, VdfError};
use crate::layout::FileLayout;
use crate::types::{Dimensions, GridConfig, GridType};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What to do with a source file that fails to decode or has the wrong size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestPolicy {
    /// Log a warning, stage nothing for that file and continue
    #[default]
    Skip,
    /// Fail the whole folder
    Abort,
}

/// Run configuration
///
/// ```json
/// {
///   "grid_type": "spherical",
///   "dimensions": { "x": 64, "y": 64, "z": 64 },
///   "ingest_policy": "abort"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssemblerConfig {
    #[serde(default = "default_grid_type")]
    pub grid_type: GridType,

    pub dimensions: Dimensions,

    #[serde(default)]
    pub ingest_policy: IngestPolicy,

    /// Compression of raw source files; detected per file when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression: Option<CompressionMethod>,

    /// Name of the consolidated output inside the destination folder
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_filename: Option<String>,
}

fn default_grid_type() -> GridType {
    GridType::Cartesian
}

impl AssemblerConfig {
    pub fn new(grid_type: GridType, dimensions: Dimensions) -> Self {
        Self {
            grid_type,
            dimensions,
            ingest_policy: IngestPolicy::default(),
            compression: None,
            final_filename: None,
        }
    }

    pub fn with_ingest_policy(mut self, policy: IngestPolicy) -> Self {
        self.ingest_policy = policy;
        self
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        serde_json::from_slice(&bytes)
            .map_err(|e| VdfError::Configuration(format!("{}: {}", path.display(), e)))
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Validate grid type and dimensions
    pub fn grid_config(&self) -> Result<GridConfig> {
        GridConfig::new(self.grid_type, self.dimensions)
    }

    /// File names for the destination folder
    pub fn file_layout(&self) -> Result<FileLayout> {
        let layout = FileLayout::default();
        match &self.final_filename {
            None => Ok(layout),
            Some(name) if name.is_empty() || name.contains(['/', '\\']) => Err(
                VdfError::Configuration(format!("invalid final file name {:?}", name)),
            ),
            Some(name) => Ok(layout.with_final_filename(name.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal_json() {
        let config: AssemblerConfig =
            serde_json::from_str(r#"{ "dimensions": { "x": 2, "y": 3, "z": 4 } }"#).unwrap();
        assert_eq!(config.grid_type, GridType::Cartesian);
        assert_eq!(config.ingest_policy, IngestPolicy::Skip);
        assert_eq!(config.compression, None);
        assert_eq!(config.grid_config().unwrap().voxels_per_timestep(), 24);
    }

    #[test]
    fn test_parse_full_json() {
        let json = r#"{
            "grid_type": "spherical",
            "dimensions": { "x": 8, "y": 8, "z": 8 },
            "ingest_policy": "abort",
            "compression": "zstd",
            "final_filename": "sun.vdf"
        }"#;
        let config: AssemblerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.grid_type, GridType::Spherical);
        assert_eq!(config.ingest_policy, IngestPolicy::Abort);
        assert_eq!(config.compression, Some(CompressionMethod::Zstd));
        assert_eq!(config.file_layout().unwrap().final_filename, "sun.vdf");
    }

    #[test]
    fn test_unknown_grid_type_rejected() {
        let json = r#"{ "grid_type": "toroidal", "dimensions": { "x": 1, "y": 1, "z": 1 } }"#;
        assert!(serde_json::from_str::<AssemblerConfig>(json).is_err());
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let config: AssemblerConfig =
            serde_json::from_str(r#"{ "dimensions": { "x": 2, "y": 0, "z": 4 } }"#).unwrap();
        assert!(config.grid_config().unwrap_err().is_configuration());
    }

    #[test]
    fn test_bad_final_filename() {
        let mut config = AssemblerConfig::new(GridType::Cartesian, Dimensions::new(1, 1, 1).unwrap());
        config.final_filename = Some("../escape.vdf".to_string());
        assert!(config.file_layout().is_err());
    }

    #[test]
    fn test_json_file_roundtrip() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let config = AssemblerConfig::new(GridType::Spherical, Dimensions::new(4, 4, 2).unwrap())
            .with_ingest_policy(IngestPolicy::Abort);
        std::fs::write(&path, config.to_json_pretty().unwrap()).unwrap();

        assert_eq!(AssemblerConfig::from_json_file(&path).unwrap(), config);
    }
}
