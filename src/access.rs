//! Read access to finished VDF files

use crate::error::{Result, VdfError};
use crate::metadata::{VdfHeader, SAMPLE_SIZE};
use crate::types::{GlobalRange, GridConfig};
use crate::utils::{format_bytes, le_bytes_into_samples};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Open VDF file with a validated header
pub struct VdfReader {
    path: PathBuf,
    file: File,
    header: VdfHeader,
    config: GridConfig,
}

impl VdfReader {
    /// Open a VDF file and check that its size matches its header
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;
        let header = VdfHeader::read_from(&mut file)?;
        let config = header.grid_config()?;

        let actual = file.metadata()?.len();
        let expected = header.expected_file_size();
        if actual != expected {
            return Err(VdfError::InvalidFormat(format!(
                "{} is {} bytes, header implies {}",
                path.display(),
                actual,
                expected
            )));
        }

        Ok(Self {
            path,
            file,
            header,
            config,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header(&self) -> &VdfHeader {
        &self.header
    }

    pub fn grid_config(&self) -> &GridConfig {
        &self.config
    }

    pub fn num_timesteps(&self) -> u32 {
        self.header.num_timesteps
    }

    /// Raw-unit range the samples were normalized against
    pub fn range(&self) -> GlobalRange {
        self.header.range()
    }

    /// Read one normalized timestep block
    pub fn read_timestep(&mut self, timestep: u32) -> Result<Vec<f32>> {
        let mut samples = Vec::new();
        self.read_timestep_into(timestep, &mut samples)?;
        Ok(samples)
    }

    /// Read one normalized timestep block into an existing buffer
    pub fn read_timestep_into(&mut self, timestep: u32, samples: &mut Vec<f32>) -> Result<()> {
        if timestep >= self.header.num_timesteps {
            return Err(VdfError::InvalidFormat(format!(
                "timestep {} out of range, file has {}",
                timestep, self.header.num_timesteps
            )));
        }

        let mut bytes = vec![0u8; self.config.voxels_per_timestep() * SAMPLE_SIZE];
        self.file
            .seek(SeekFrom::Start(self.header.block_offset(timestep)))?;
        self.file.read_exact(&mut bytes)?;
        le_bytes_into_samples(&bytes, samples)
    }

    /// Map a normalized sample back to raw units
    pub fn denormalize(&self, value: f32) -> f32 {
        let range = self.range();
        let min = range.min as f64;
        (min + value as f64 * (range.max as f64 - min)) as f32
    }

    pub fn stats(&self) -> VolumeStats {
        VolumeStats {
            config: self.config,
            num_timesteps: self.header.num_timesteps,
            range: self.range(),
            file_size: self.header.expected_file_size(),
        }
    }
}

/// Volume statistics
#[derive(Debug, Clone)]
pub struct VolumeStats {
    pub config: GridConfig,
    pub num_timesteps: u32,
    pub range: GlobalRange,
    pub file_size: u64,
}

impl VolumeStats {
    pub fn total_voxels(&self) -> u64 {
        self.config.voxels_per_timestep() as u64 * self.num_timesteps as u64
    }

    pub fn summary(&self) -> String {
        format!(
            "{} grid {}: {} timesteps, {} voxels, range [{}, {}], {}",
            self.config.grid_type,
            self.config.dimensions,
            self.num_timesteps,
            self.total_voxels(),
            self.range.min,
            self.range.max,
            format_bytes(self.file_size),
        )
    }
}
