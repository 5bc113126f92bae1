//! Core data types for VDF assembly

use crate::error::{Result, VdfError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Value written for every voxel when all samples share one value
pub const NORMALIZED_MIDPOINT: f32 = 0.5;

/// Grid geometry of the source volumes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum GridType {
    /// Regular x/y/z grid
    Cartesian = 0,
    /// Radius/theta/phi grid
    Spherical = 1,
}

impl GridType {
    /// On-disk code of this grid type
    pub fn code(&self) -> u32 {
        *self as u32
    }
}

impl TryFrom<u32> for GridType {
    type Error = VdfError;

    fn try_from(value: u32) -> Result<Self> {
        match value {
            0 => Ok(GridType::Cartesian),
            1 => Ok(GridType::Spherical),
            other => Err(VdfError::InvalidGridType(other)),
        }
    }
}

impl fmt::Display for GridType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GridType::Cartesian => write!(f, "cartesian"),
            GridType::Spherical => write!(f, "spherical"),
        }
    }
}

/// Voxel grid shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Dimensions {
    /// Create a validated grid shape
    pub fn new(x: u32, y: u32, z: u32) -> Result<Self> {
        let dims = Self { x, y, z };
        dims.validate()?;
        Ok(dims)
    }

    /// Reject zero-sized axes and voxel counts that do not fit in memory
    pub fn validate(&self) -> Result<()> {
        if self.x == 0 || self.y == 0 || self.z == 0 {
            return Err(VdfError::InvalidDimensions(format!(
                "all dimensions must be positive, got {}",
                self
            )));
        }
        self.checked_voxel_count().map(|_| ())
    }

    /// Number of voxels in one timestep
    pub fn voxel_count(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }

    fn checked_voxel_count(&self) -> Result<usize> {
        (self.x as usize)
            .checked_mul(self.y as usize)
            .and_then(|xy| xy.checked_mul(self.z as usize))
            .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()).map(|_| n))
            .ok_or_else(|| {
                VdfError::InvalidDimensions(format!("voxel count of {} overflows", self))
            })
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {} x {}", self.x, self.y, self.z)
    }
}

/// Validated grid configuration; fixed for the duration of one run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridConfig {
    pub grid_type: GridType,
    pub dimensions: Dimensions,
}

impl GridConfig {
    pub fn new(grid_type: GridType, dimensions: Dimensions) -> Result<Self> {
        dimensions.validate()?;
        Ok(Self {
            grid_type,
            dimensions,
        })
    }

    /// Number of samples every timestep buffer and block must hold
    pub fn voxels_per_timestep(&self) -> usize {
        self.dimensions.voxel_count()
    }
}

/// Running minimum/maximum over every sample seen so far.
///
/// Starts out empty (`min = +inf`, `max = -inf`). NaN samples do not
/// move the range, and [`normalize`](Self::normalize) passes them through
/// unchanged: a NaN voxel in a source file is still NaN in the VDF file.
/// Every other sample of a valid range lands in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlobalRange {
    pub min: f32,
    pub max: f32,
}

impl GlobalRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// The sentinel range before any sample was observed
    pub fn empty() -> Self {
        Self {
            min: f32::INFINITY,
            max: f32::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.is_nan() || self.max.is_nan() || self.min > self.max
    }

    /// All observed samples were equal
    pub fn is_degenerate(&self) -> bool {
        self.min == self.max
    }

    pub fn is_valid(&self) -> bool {
        self.min.is_finite() && self.max.is_finite() && self.min <= self.max
    }

    /// Fold a block of samples into the range
    pub fn observe(&mut self, samples: &[f32]) {
        for &v in samples {
            self.min = self.min.min(v);
            self.max = self.max.max(v);
        }
    }

    /// Map a raw sample into `[0, 1]`.
    ///
    /// Computed in `f64` since `max - min` overflows `f32` for ranges
    /// wider than `f32::MAX`.
    pub fn normalize(&self, value: f32) -> f32 {
        if value.is_nan() {
            return value;
        }
        if self.is_degenerate() {
            return NORMALIZED_MIDPOINT;
        }
        let min = self.min as f64;
        ((value as f64 - min) / (self.max as f64 - min)) as f32
    }

    /// Normalize a whole block in place
    pub fn normalize_in_place(&self, samples: &mut [f32]) {
        for v in samples.iter_mut() {
            *v = self.normalize(*v);
        }
    }
}

impl Default for GlobalRange {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_grid_type_codes() {
        assert_eq!(GridType::try_from(0).unwrap(), GridType::Cartesian);
        assert_eq!(GridType::try_from(1).unwrap(), GridType::Spherical);
        assert!(matches!(
            GridType::try_from(2),
            Err(VdfError::InvalidGridType(2))
        ));
        assert_eq!(GridType::Spherical.code(), 1);
    }

    #[test]
    fn test_dimensions_validation() {
        assert_eq!(Dimensions::new(2, 3, 4).unwrap().voxel_count(), 24);
        assert!(Dimensions::new(0, 3, 4).is_err());
        assert!(Dimensions::new(2, 0, 4).is_err());
        assert!(Dimensions::new(2, 3, 0).is_err());
    }

    #[test]
    fn test_grid_config_voxels() {
        let config = GridConfig::new(GridType::Cartesian, Dimensions::new(8, 4, 2).unwrap()).unwrap();
        assert_eq!(config.voxels_per_timestep(), 64);
    }

    #[test]
    fn test_empty_range() {
        let range = GlobalRange::empty();
        assert!(range.is_empty());
        assert!(!range.is_valid());

        let mut range = range;
        range.observe(&[3.0]);
        assert!(!range.is_empty());
        assert!(range.is_degenerate());
    }

    #[test]
    fn test_observe_across_blocks() {
        let mut range = GlobalRange::empty();
        range.observe(&[0.0, 10.0, 4.0]);
        range.observe(&[5.0, 20.0]);

        assert_eq!(range, GlobalRange::new(0.0, 20.0));
        assert_eq!(range.normalize(5.0), 0.25);
        assert_eq!(range.normalize(20.0), 1.0);
    }

    #[test]
    fn test_normalize_span_wider_than_f32() {
        let mut range = GlobalRange::empty();
        range.observe(&[-3.0e38, 0.0, 3.0e38]);
        assert!(range.is_valid());

        assert_eq!(range.normalize(-3.0e38), 0.0);
        assert_eq!(range.normalize(0.0), 0.5);
        assert_eq!(range.normalize(3.0e38), 1.0);

        let full = GlobalRange::new(f32::MIN, f32::MAX);
        assert!(full.is_valid());
        assert_eq!(full.normalize(f32::MIN), 0.0);
        assert_eq!(full.normalize(f32::MAX), 1.0);
    }

    #[test]
    fn test_infinite_sample_makes_range_invalid() {
        let mut range = GlobalRange::empty();
        range.observe(&[0.0, 1.0, f32::INFINITY]);
        assert!(!range.is_empty());
        assert!(!range.is_valid());
    }

    #[test]
    fn test_nan_sample_passes_through() {
        let range = GlobalRange::new(0.0, 2.0);
        assert!(range.normalize(f32::NAN).is_nan());
        assert!(GlobalRange::new(1.0, 1.0).normalize(f32::NAN).is_nan());
        assert_eq!(range.normalize(1.0), 0.5);
    }

    #[test]
    fn test_observe_ignores_nan() {
        let mut range = GlobalRange::empty();
        range.observe(&[f32::NAN, 1.0, 2.0]);
        assert_eq!(range, GlobalRange::new(1.0, 2.0));
    }

    #[test]
    fn test_degenerate_range_uses_midpoint() {
        let range = GlobalRange::new(5.0, 5.0);
        let mut block = vec![5.0; 8];
        range.normalize_in_place(&mut block);
        assert!(block.iter().all(|&v| v == NORMALIZED_MIDPOINT));
    }

    proptest! {
        #[test]
        fn normalized_samples_stay_in_unit_range(
            samples in prop::collection::vec(-1.0e6f32..1.0e6, 1..256)
        ) {
            let mut range = GlobalRange::empty();
            range.observe(&samples);
            for &v in &samples {
                let n = range.normalize(v);
                prop_assert!(n.is_finite());
                prop_assert!((0.0..=1.0).contains(&n));
            }
        }
    }
}
