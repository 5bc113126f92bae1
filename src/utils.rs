//! Utility functions

use crate::error::{Result, VdfError};
use crate::metadata::SAMPLE_SIZE;

/// Decode little-endian `f32` samples
pub fn le_bytes_to_samples(bytes: &[u8]) -> Result<Vec<f32>> {
    let mut samples = Vec::with_capacity(bytes.len() / SAMPLE_SIZE);
    le_bytes_into_samples(bytes, &mut samples)?;
    Ok(samples)
}

/// Decode little-endian `f32` samples into an existing buffer, replacing its contents
pub fn le_bytes_into_samples(bytes: &[u8], samples: &mut Vec<f32>) -> Result<()> {
    if bytes.len() % SAMPLE_SIZE != 0 {
        return Err(VdfError::InvalidFormat(
            "Byte length not aligned with f32 sample size".to_string(),
        ));
    }

    samples.clear();
    samples.extend(
        bytes
            .chunks_exact(SAMPLE_SIZE)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]])),
    );
    Ok(())
}

/// Encode samples as little-endian bytes
pub fn samples_to_le_bytes(samples: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * SAMPLE_SIZE);
    for v in samples {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes
}

/// Format byte size in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];

    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
