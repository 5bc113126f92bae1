//! Staged working files of one assembly run
//!
//! A [`StagingArea`] owns the header temp file and the per-timestep temp
//! files a run writes into its destination folder. Every file it may have
//! created is removed by [`StagingArea::delete_temp_files`], which also runs
//! on drop if the caller never did.

use crate::error::{Result, VdfError};
use crate::io::{ensure_dir, remove_if_exists, write_samples};
use crate::layout::FileLayout;
use crate::metadata::VdfHeader;
use crate::types::{GlobalRange, GridConfig};
use std::fs;
use std::path::{Path, PathBuf};

/// Header temp plus ordered timestep temps in a destination folder
#[derive(Debug)]
pub struct StagingArea {
    dest: PathBuf,
    layout: FileLayout,
    config: GridConfig,
    num_timesteps: u32,
    cleaned: bool,
}

impl StagingArea {
    /// Prepare staging in `dest`, creating the folder if needed
    pub fn create(dest: impl AsRef<Path>, layout: FileLayout, config: GridConfig) -> Result<Self> {
        let dest = dest.as_ref().to_path_buf();
        ensure_dir(&dest)?;
        Ok(Self {
            dest,
            layout,
            config,
            num_timesteps: 0,
            cleaned: false,
        })
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn layout(&self) -> &FileLayout {
        &self.layout
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Number of timesteps staged so far
    pub fn num_timesteps(&self) -> u32 {
        self.num_timesteps
    }

    pub fn header_path(&self) -> PathBuf {
        self.layout.header_path(&self.dest)
    }

    pub fn timestep_path(&self, index: u32) -> PathBuf {
        self.layout.timestep_path(&self.dest, index)
    }

    /// Paths of all staged timesteps in index order
    pub fn timestep_paths(&self) -> impl Iterator<Item = PathBuf> + '_ {
        (0..self.num_timesteps).map(move |i| self.timestep_path(i))
    }

    /// Write the header temp file with the current timestep count and an
    /// empty global range. Overwrites any previous header.
    pub fn write_header(&self) -> Result<PathBuf> {
        let path = self.header_path();
        let header = VdfHeader::staged(&self.config).with_totals(self.num_timesteps, GlobalRange::empty());
        fs::write(&path, header.encode()?).map_err(|e| VdfError::temp_file(&path, e))?;
        log::debug!("staged header at {}", path.display());
        Ok(path)
    }

    /// Stage one timestep of raw samples; returns its index
    pub fn write_timestep(&mut self, samples: &[f32]) -> Result<u32> {
        let expected = self.config.voxels_per_timestep();
        if samples.len() != expected {
            return Err(VdfError::Consistency(format!(
                "timestep {} has {} samples, expected {}",
                self.num_timesteps,
                samples.len(),
                expected
            )));
        }

        let index = self.num_timesteps;
        let path = self.timestep_path(index);
        if let Err(e) = write_samples(&path, samples) {
            // The count is not advanced, so drop the partial file here
            if let Err(cleanup) = remove_if_exists(&path) {
                log::warn!("could not remove partial {}: {}", path.display(), cleanup);
            }
            return Err(e);
        }

        self.num_timesteps += 1;
        log::debug!("staged timestep {} at {}", index, path.display());
        Ok(index)
    }

    /// Remove every file this run may have created, except the final file.
    ///
    /// Missing files are fine; calling this twice is fine. Returns how many
    /// files were removed.
    pub fn delete_temp_files(&mut self) -> Result<usize> {
        self.cleaned = true;
        delete_temp_files(&self.dest, &self.layout, self.num_timesteps)
    }
}

impl Drop for StagingArea {
    fn drop(&mut self) {
        if self.cleaned {
            return;
        }
        if let Err(e) = self.delete_temp_files() {
            log::warn!("failed to clean staging in {}: {}", self.dest.display(), e);
        }
    }
}

/// Remove the header temp, timestep temps `0..num_timesteps` and the partial
/// final file from `dest`, then any other `timestep_<n>.tmp` left behind by
/// an earlier run that stopped before cleaning up.
///
/// Every file is attempted even if an earlier removal fails; the first
/// failure is returned.
pub fn delete_temp_files(dest: &Path, layout: &FileLayout, num_timesteps: u32) -> Result<usize> {
    let mut paths: Vec<PathBuf> = std::iter::once(layout.header_path(dest))
        .chain((0..num_timesteps).map(|i| layout.timestep_path(dest, i)))
        .chain(std::iter::once(layout.partial_final_path(dest)))
        .collect();

    let mut removed = 0;
    let mut first_error = None;
    match stale_timestep_paths(dest, layout, num_timesteps) {
        Ok(stale) => paths.extend(stale),
        Err(e) => {
            log::warn!("could not list {}: {}", dest.display(), e);
            first_error = Some(e);
        }
    }
    for path in paths {
        match remove_if_exists(&path) {
            Ok(true) => removed += 1,
            Ok(false) => {}
            Err(e) => {
                log::warn!("could not remove {}: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => {
            log::debug!("removed {} temp files from {}", removed, dest.display());
            Ok(removed)
        }
    }
}

/// Staged timestep files in `dest` with an index at or past `num_timesteps`
fn stale_timestep_paths(dest: &Path, layout: &FileLayout, num_timesteps: u32) -> Result<Vec<PathBuf>> {
    let entries = match fs::read_dir(dest) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(VdfError::temp_file(dest, e)),
    };

    let mut stale = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| VdfError::temp_file(dest, e))?;
        let name = entry.file_name();
        let index = name.to_str().and_then(|n| layout.parse_timestep_index(n));
        if index.is_some_and(|i| i >= num_timesteps) {
            stale.push(entry.path());
        }
    }
    stale.sort();
    Ok(stale)
}
