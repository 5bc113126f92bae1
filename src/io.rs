//! Blocking file I/O for staged and source files

use crate::error::{Result, VdfError};
use crate::metadata::SAMPLE_SIZE;
use crate::utils::{le_bytes_into_samples, samples_to_le_bytes};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// List regular files in a folder that pass `accept`, sorted by file name
pub fn list_source_files<F>(folder: &Path, mut accept: F) -> Result<Vec<PathBuf>>
where
    F: FnMut(&Path) -> bool,
{
    let mut files = Vec::new();
    for entry in fs::read_dir(folder)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let hidden = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with('.'));
        if !hidden && accept(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Create the destination folder if it does not exist
pub fn ensure_dir(path: &Path) -> Result<()> {
    fs::create_dir_all(path)?;
    Ok(())
}

/// Write samples to a file, replacing any previous contents
pub fn write_samples(path: &Path, samples: &[f32]) -> Result<()> {
    let file = fs::File::create(path).map_err(|e| VdfError::temp_file(path, e))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(&samples_to_le_bytes(samples))
        .and_then(|_| writer.flush())
        .map_err(|e| VdfError::temp_file(path, e))?;
    Ok(())
}

/// Read exactly `expected` samples from a staged file into `samples`.
///
/// A file holding any other number of samples is a consistency error.
pub fn read_samples(path: &Path, expected: usize, samples: &mut Vec<f32>) -> Result<()> {
    let bytes = fs::read(path).map_err(|e| VdfError::temp_file(path, e))?;
    if bytes.len() != expected * SAMPLE_SIZE {
        return Err(VdfError::Consistency(format!(
            "{} holds {} bytes, expected {} samples ({} bytes)",
            path.display(),
            bytes.len(),
            expected,
            expected * SAMPLE_SIZE
        )));
    }
    le_bytes_into_samples(&bytes, samples)
}

/// Remove a file; a file that is already gone is not an error.
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(VdfError::temp_file(path, e)),
    }
}
