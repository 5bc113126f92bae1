//! File layout of a run - where staged and final files live in the destination folder

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix shared by every working file
pub const TEMP_SUFFIX: &str = ".tmp";

/// Stem of the staged header
pub const HEADER_STEM: &str = "header";

/// Stem of the staged timesteps, followed by the ordinal index
pub const TIMESTEP_STEM: &str = "timestep_";

/// Name of the consolidated output
pub const FINAL_FILENAME: &str = "volume.vdf";

/// Names of the files a run creates in its destination folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLayout {
    pub header_stem: String,
    pub timestep_stem: String,
    pub temp_suffix: String,
    pub final_filename: String,
}

impl FileLayout {
    /// Use a different name for the final file
    pub fn with_final_filename(mut self, name: impl Into<String>) -> Self {
        self.final_filename = name.into();
        self
    }

    pub fn header_filename(&self) -> String {
        format!("{}{}", self.header_stem, self.temp_suffix)
    }

    pub fn timestep_filename(&self, index: u32) -> String {
        format!("{}{}{}", self.timestep_stem, index, self.temp_suffix)
    }

    /// Index of a staged timestep file name, `None` for any other name
    pub fn parse_timestep_index(&self, filename: &str) -> Option<u32> {
        let digits = filename
            .strip_prefix(self.timestep_stem.as_str())?
            .strip_suffix(self.temp_suffix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Name the final file carries until it is complete
    pub fn partial_final_filename(&self) -> String {
        format!("{}{}", self.final_filename, self.temp_suffix)
    }

    pub fn header_path(&self, dest: &Path) -> PathBuf {
        dest.join(self.header_filename())
    }

    pub fn timestep_path(&self, dest: &Path, index: u32) -> PathBuf {
        dest.join(self.timestep_filename(index))
    }

    pub fn final_path(&self, dest: &Path) -> PathBuf {
        dest.join(&self.final_filename)
    }

    pub fn partial_final_path(&self, dest: &Path) -> PathBuf {
        dest.join(self.partial_final_filename())
    }
}

impl Default for FileLayout {
    fn default() -> Self {
        Self {
            header_stem: HEADER_STEM.to_string(),
            timestep_stem: TIMESTEP_STEM.to_string(),
            temp_suffix: TEMP_SUFFIX.to_string(),
            final_filename: FINAL_FILENAME.to_string(),
        }
    }
}
