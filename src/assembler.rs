//! Volume assembler - turns a folder of snapshots into one VDF file
//!
//! Processing runs strictly in order:
//!
//! 1. enumerate the source folder (sorted by file name)
//! 2. decode each file and stage its raw samples as `timestep_<i>.tmp`
//! 3. scan every staged timestep to find the global min/max
//! 4. write `volume.vdf`: header, then every timestep normalized into `[0, 1]`
//! 5. delete the staged files, on success and on failure alike
//!
//! A run that fails after configuration is accepted also removes any
//! `volume.vdf` an earlier run left in the destination, so the folder never
//! holds a final file that does not match the latest source folder.
//!
//! Normalization is deferred to step 4 so the source files are decoded only
//! once and only one timestep is held in memory at a time.

use crate::config::{AssemblerConfig, IngestPolicy};
use crate::error::{Result, VdfError};
use crate::io::{list_source_files, read_samples, remove_if_exists};
use crate::layout::FileLayout;
use crate::metadata::VdfHeader;
use crate::reader::SourceReader;
use crate::staging::StagingArea;
use crate::types::{Dimensions, GlobalRange, GridConfig, GridType};
use crate::utils::{format_bytes, samples_to_le_bytes};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Outcome of a successful [`VolumeAssembler::process_folder`]
#[derive(Debug, Clone)]
pub struct AssemblyReport {
    /// Path of the written VDF file
    pub final_path: PathBuf,
    /// Header as written to the final file
    pub header: VdfHeader,
    /// Source file of each timestep, in timestep order
    pub timesteps: Vec<PathBuf>,
    /// Source files that were not staged
    pub skipped: Vec<PathBuf>,
}

/// Orchestrates reading, staging, normalization and consolidation
pub struct VolumeAssembler<R> {
    reader: R,
    grid_type: GridType,
    dimensions: Option<Dimensions>,
    policy: IngestPolicy,
    layout: FileLayout,
    has_read: bool,
}

impl<R: SourceReader> VolumeAssembler<R> {
    /// Create an assembler with a cartesian grid and no dimensions set
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            grid_type: GridType::Cartesian,
            dimensions: None,
            policy: IngestPolicy::default(),
            layout: FileLayout::default(),
            has_read: false,
        }
    }

    /// Create an assembler from a validated configuration
    pub fn from_config(reader: R, config: &AssemblerConfig) -> Result<Self> {
        let grid = config.grid_config()?;
        let mut assembler = Self::new(reader)
            .with_ingest_policy(config.ingest_policy)
            .with_layout(config.file_layout()?);
        assembler.grid_type = grid.grid_type;
        assembler.dimensions = Some(grid.dimensions);
        Ok(assembler)
    }

    pub fn with_ingest_policy(mut self, policy: IngestPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_layout(mut self, layout: FileLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Record the voxel grid shape. All dimensions must be positive.
    pub fn set_dimensions(&mut self, x: u32, y: u32, z: u32) -> Result<()> {
        self.dimensions = Some(Dimensions::new(x, y, z)?);
        Ok(())
    }

    /// Record the grid type: 0 for cartesian, 1 for spherical
    pub fn set_grid_type(&mut self, grid_type: u32) -> Result<()> {
        self.grid_type = GridType::try_from(grid_type)?;
        Ok(())
    }

    /// The validated grid configuration
    pub fn grid_config(&self) -> Result<GridConfig> {
        let dimensions = self
            .dimensions
            .ok_or_else(|| VdfError::InvalidDimensions("dimensions not set".to_string()))?;
        GridConfig::new(self.grid_type, dimensions)
    }

    /// Samples expected per timestep, once dimensions are set
    pub fn voxels_per_timestep(&self) -> Option<usize> {
        self.dimensions.map(|d| d.voxel_count())
    }

    /// Whether the last run staged at least one timestep
    pub fn has_read(&self) -> bool {
        self.has_read
    }

    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    /// Convert every accepted file in `source` into one VDF file in `dest`.
    ///
    /// Configuration is validated before anything is touched. Staged files
    /// are removed before returning, whether or not the run succeeded. On
    /// any later failure the final file in `dest` is removed as well, including
    /// one written by an earlier successful run.
    pub fn process_folder(&mut self, source: &Path, dest: &Path) -> Result<AssemblyReport> {
        let config = self.grid_config()?;
        self.has_read = false;

        match self.assemble(source, dest, config) {
            Ok(report) => Ok(report),
            Err(e) => {
                let stale = self.layout.final_path(dest);
                match remove_if_exists(&stale) {
                    Ok(true) => log::warn!("removed stale {} after failed run", stale.display()),
                    Ok(false) => {}
                    Err(cleanup) => log::warn!("could not remove {}: {}", stale.display(), cleanup),
                }
                Err(e)
            }
        }
    }

    fn assemble(&mut self, source: &Path, dest: &Path, config: GridConfig) -> Result<AssemblyReport> {
        let reader = &self.reader;
        let files = list_source_files(source, |p| reader.accepts(p))?;
        log::info!(
            "assembling {} source files from {} ({} grid {})",
            files.len(),
            source.display(),
            config.grid_type,
            config.dimensions
        );

        let mut staging = StagingArea::create(dest, self.layout.clone(), config)?;
        let result = self.stage_and_finalize(source, &files, &mut staging);

        if let Err(e) = staging.delete_temp_files() {
            log::warn!("temp files left in {}: {}", dest.display(), e);
        }

        let report = result?;
        let size = fs::metadata(&report.final_path).map(|m| m.len()).unwrap_or(0);
        log::info!(
            "wrote {} ({}, {})",
            report.final_path.display(),
            report.header.summary(),
            format_bytes(size)
        );
        Ok(report)
    }

    fn stage_and_finalize(
        &mut self,
        source: &Path,
        files: &[PathBuf],
        staging: &mut StagingArea,
    ) -> Result<AssemblyReport> {
        staging.write_header()?;

        let voxels = staging.config().voxels_per_timestep();
        let mut buffer = Vec::with_capacity(voxels);
        let mut timesteps = Vec::new();
        let mut skipped = Vec::new();

        for path in files {
            let timestep = staging.num_timesteps();
            match self.ingest(path, timestep, voxels, &mut buffer) {
                Ok(()) => {
                    staging.write_timestep(&buffer)?;
                    timesteps.push(path.clone());
                }
                Err(e) => match self.policy {
                    IngestPolicy::Skip => {
                        log::warn!("skipping {}: {}", path.display(), e);
                        skipped.push(path.clone());
                    }
                    IngestPolicy::Abort => return Err(e),
                },
            }
        }

        if staging.num_timesteps() == 0 {
            return Err(VdfError::NoTimesteps(source.to_path_buf()));
        }
        self.has_read = true;

        // Refresh the staged header with the final count
        staging.write_header()?;
        let header = write_final(staging)?;

        Ok(AssemblyReport {
            final_path: staging.layout().final_path(staging.dest()),
            header,
            timesteps,
            skipped,
        })
    }

    fn ingest(&mut self, path: &Path, timestep: u32, voxels: usize, buffer: &mut Vec<f32>) -> Result<()> {
        self.reader.read_file(path, timestep, buffer)?;
        if !self.reader.has_read() {
            return Err(VdfError::Ingestion {
                path: path.to_path_buf(),
                reason: "reader produced no data".to_string(),
            });
        }
        if buffer.len() != voxels {
            return Err(VdfError::Ingestion {
                path: path.to_path_buf(),
                reason: format!("expected {} samples, got {}", voxels, buffer.len()),
            });
        }
        Ok(())
    }
}

/// Normalize every staged timestep into the final VDF file.
///
/// The final file is written under its partial name and renamed into place
/// only once complete; on failure the partial file is removed and no final
/// file is produced.
pub fn write_final(staging: &StagingArea) -> Result<VdfHeader> {
    let range = scan_timesteps(staging)?;
    log::info!(
        "global range over {} timesteps: [{}, {}]",
        staging.num_timesteps(),
        range.min,
        range.max
    );
    emit_final(staging, range)
}

/// Read the staged header and every staged timestep and return the global range
pub fn scan_timesteps(staging: &StagingArea) -> Result<GlobalRange> {
    check_staged_header(staging)?;

    let voxels = staging.config().voxels_per_timestep();
    let mut buffer = Vec::with_capacity(voxels);
    let mut range = GlobalRange::empty();
    for path in staging.timestep_paths() {
        read_samples(&path, voxels, &mut buffer)?;
        range.observe(&buffer);
    }

    if range.is_empty() {
        return Err(VdfError::Consistency(
            "staged timesteps hold no comparable samples".to_string(),
        ));
    }
    if !range.is_valid() {
        return Err(VdfError::Consistency(format!(
            "staged timesteps span a non-finite range [{}, {}]",
            range.min, range.max
        )));
    }
    Ok(range)
}

fn check_staged_header(staging: &StagingArea) -> Result<()> {
    let path = staging.header_path();
    let bytes = fs::read(&path).map_err(|e| VdfError::temp_file(&path, e))?;
    let staged = VdfHeader::decode(&bytes)?.grid_config()?;
    if staged != *staging.config() {
        return Err(VdfError::Consistency(format!(
            "staged header describes {} grid {}, run uses {} grid {}",
            staged.grid_type,
            staged.dimensions,
            staging.config().grid_type,
            staging.config().dimensions
        )));
    }
    Ok(())
}

/// Write the final file using a known global range
pub fn emit_final(staging: &StagingArea, range: GlobalRange) -> Result<VdfHeader> {
    let header = VdfHeader::new(staging.config(), staging.num_timesteps(), range);
    let partial = staging.layout().partial_final_path(staging.dest());
    let final_path = staging.layout().final_path(staging.dest());

    let written = write_normalized(&partial, &header, staging)
        .and_then(|_| fs::rename(&partial, &final_path).map_err(VdfError::Io));
    if let Err(e) = written {
        if let Err(cleanup) = remove_if_exists(&partial) {
            log::warn!("could not remove partial {}: {}", partial.display(), cleanup);
        }
        return Err(e);
    }
    Ok(header)
}

fn write_normalized(path: &Path, header: &VdfHeader, staging: &StagingArea) -> Result<()> {
    let file = fs::File::create(path)?;
    let mut writer = BufWriter::new(file);
    header.write_to(&mut writer)?;

    let range = header.range();
    let voxels = staging.config().voxels_per_timestep();
    let mut buffer = Vec::with_capacity(voxels);
    for (index, timestep) in staging.timestep_paths().enumerate() {
        read_samples(&timestep, voxels, &mut buffer)?;
        range.normalize_in_place(&mut buffer);
        writer.write_all(&samples_to_le_bytes(&buffer))?;
        log::debug!("emitted timestep {}", index);
    }

    let file = writer.into_inner().map_err(|e| VdfError::Io(e.into_error()))?;
    file.sync_all()?;
    Ok(())
}
