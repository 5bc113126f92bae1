//! VDF header metadata
//!
//! The header is a fixed 28-byte little-endian block at the start of every
//! VDF file (and of the staged `header.tmp`):
//!
//! | offset | type | field          |
//! |-------:|------|----------------|
//! | 0      | u32  | grid type      |
//! | 4      | u32  | x dimension    |
//! | 8      | u32  | y dimension    |
//! | 12     | u32  | z dimension    |
//! | 16     | u32  | timestep count |
//! | 20     | f32  | global min     |
//! | 24     | f32  | global max     |
//!
//! It is followed by `timestep count` blocks of `x * y * z` little-endian
//! `f32` samples normalized into `[0, 1]`. Min and max are always finite.
//! A NaN source sample stays NaN in its block and marks a missing value.

use crate::error::{Result, VdfError};
use crate::types::{Dimensions, GlobalRange, GridConfig, GridType};
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

/// Encoded size of [`VdfHeader`] in bytes
pub const HEADER_SIZE: usize = 28;

/// Size of one encoded sample
pub const SAMPLE_SIZE: usize = std::mem::size_of::<f32>();

/// Fixed-layout VDF header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VdfHeader {
    pub grid_type: u32,
    pub x_dim: u32,
    pub y_dim: u32,
    pub z_dim: u32,
    pub num_timesteps: u32,
    pub min: f32,
    pub max: f32,
}

impl VdfHeader {
    /// Header for a grid with no timesteps and no observed range yet
    pub fn staged(config: &GridConfig) -> Self {
        Self::new(config, 0, GlobalRange::empty())
    }

    pub fn new(config: &GridConfig, num_timesteps: u32, range: GlobalRange) -> Self {
        Self {
            grid_type: config.grid_type.code(),
            x_dim: config.dimensions.x,
            y_dim: config.dimensions.y,
            z_dim: config.dimensions.z,
            num_timesteps,
            min: range.min,
            max: range.max,
        }
    }

    /// Set timestep count and global range
    pub fn with_totals(mut self, num_timesteps: u32, range: GlobalRange) -> Self {
        self.num_timesteps = num_timesteps;
        self.min = range.min;
        self.max = range.max;
        self
    }

    /// Decode grid type and dimensions, rejecting unknown codes and empty axes
    pub fn grid_config(&self) -> Result<GridConfig> {
        let grid_type = GridType::try_from(self.grid_type)?;
        let dimensions = Dimensions::new(self.x_dim, self.y_dim, self.z_dim)?;
        GridConfig::new(grid_type, dimensions)
    }

    pub fn range(&self) -> GlobalRange {
        GlobalRange::new(self.min, self.max)
    }

    pub fn voxels_per_timestep(&self) -> usize {
        self.x_dim as usize * self.y_dim as usize * self.z_dim as usize
    }

    /// Size in bytes of one timestep block
    pub fn block_size_bytes(&self) -> u64 {
        (self.voxels_per_timestep() * SAMPLE_SIZE) as u64
    }

    /// Byte offset of a timestep block in the final file
    pub fn block_offset(&self, timestep: u32) -> u64 {
        HEADER_SIZE as u64 + timestep as u64 * self.block_size_bytes()
    }

    /// Exact size of a complete VDF file with this header
    pub fn expected_file_size(&self) -> u64 {
        self.block_offset(self.num_timesteps)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        let bytes = bincode::serialize(self)?;
        debug_assert_eq!(bytes.len(), HEADER_SIZE);
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(VdfError::InvalidFormat(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }
        Ok(bincode::deserialize(&bytes[..HEADER_SIZE])?)
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.encode()?)?;
        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_SIZE];
        reader.read_exact(&mut buf).map_err(|e| {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                VdfError::InvalidFormat("truncated header".to_string())
            } else {
                VdfError::Io(e)
            }
        })?;
        Self::decode(&buf)
    }

    /// One-line description for logs and the CLI
    pub fn summary(&self) -> String {
        let grid = GridType::try_from(self.grid_type)
            .map(|g| g.to_string())
            .unwrap_or_else(|_| format!("unknown({})", self.grid_type));
        format!(
            "{} grid {} x {} x {}, {} timesteps, range [{}, {}]",
            grid, self.x_dim, self.y_dim, self.z_dim, self.num_timesteps, self.min, self.max
        )
    }
}
