//! VDF - Volume Data Format assembler
//!
//! Converts a folder of per-timestep volume snapshots into a single VDF file:
//! a fixed 28-byte header followed by one block of normalized `f32` samples
//! per timestep, all timesteps sharing one global value range.
//!
//! # Features
//!
//! - Pluggable source formats through the [`SourceReader`] trait
//! - Raw `f32` reader with optional Deflate/Zstd compressed inputs
//! - Two-pass staging: one timestep in memory at a time
//! - Staged files cleaned up on success and failure alike
//!
//! # Example
//!
//! ```rust,ignore
//! use vdf::{RawReader, VolumeAssembler};
//! use std::path::Path;
//!
//! # fn example() -> vdf::Result<()> {
//! let mut assembler = VolumeAssembler::new(RawReader::new());
//! assembler.set_dimensions(64, 64, 64)?;
//! assembler.set_grid_type(1)?;
//!
//! let report = assembler.process_folder(Path::new("snapshots"), Path::new("out"))?;
//! println!("{}", report.header.summary());
//! # Ok(())
//! # }
//! ```

pub mod access;
pub mod assembler;
pub mod compression;
pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod metadata;
pub mod reader;
pub mod staging;
pub mod types;
pub mod utils;

// Re-exports
pub use access::{VdfReader, VolumeStats};
pub use assembler::{write_final, AssemblyReport, VolumeAssembler};
pub use compression::CompressionMethod;
pub use config::{AssemblerConfig, IngestPolicy};
pub use error::{Result, VdfError};
pub use layout::FileLayout;
pub use metadata::{VdfHeader, HEADER_SIZE};
pub use reader::{RawReader, SourceReader};
pub use staging::StagingArea;
pub use types::{Dimensions, GlobalRange, GridConfig, GridType, NORMALIZED_MIDPOINT};

/// Version of the VDF assembler
pub const VDF_VERSION: &str = env!("CARGO_PKG_VERSION");
