//! Validates on-disk files against the checksums merged into an [`Archive`].

use super::{read_padded_slice, Archive};
use crate::checksum::{compute_crc32, compute_md5_bytes};
use crate::error::ArchiveError;
use rayon::prelude::*;
use std::fs::File;
use std::path::Path;

/// Checks every file named in `recovery_file_ids` against its per-slice
/// CRC32 and MD5, one file per rayon task, matching the teacher's per-file
/// parallel verification shape. Returns the global slice indices that
/// failed, in ascending order.
pub fn validate(archive: &Archive, base_dir: &Path) -> Result<Vec<usize>, ArchiveError> {
    let slice_size = archive.slice_size as usize;

    let mut file_starts = Vec::with_capacity(archive.recovery_file_ids.len());
    let mut global_index = 0usize;
    for file_id in &archive.recovery_file_ids {
        let rf = archive
            .files
            .get(file_id)
            .ok_or_else(|| ArchiveError::FileMissing(format!("{:02x?}", file_id)))?;
        file_starts.push(global_index);
        global_index += rf.slice_md5s.len();
    }

    let results: Vec<Result<Vec<usize>, ArchiveError>> = archive
        .recovery_file_ids
        .par_iter()
        .zip(file_starts.par_iter())
        .map(|(file_id, &file_start)| validate_one(archive, base_dir, file_id, file_start, slice_size))
        .collect();

    let mut bad = Vec::new();
    for result in results {
        bad.extend(result?);
    }
    Ok(bad)
}

fn validate_one(
    archive: &Archive,
    base_dir: &Path,
    file_id: &[u8; 16],
    file_start: usize,
    slice_size: usize,
) -> Result<Vec<usize>, ArchiveError> {
    let rf = archive
        .files
        .get(file_id)
        .ok_or_else(|| ArchiveError::FileMissing(format!("{file_id:02x?}")))?;

    let path = base_dir.join(&rf.name);
    let mut file = File::open(&path).map_err(|_| ArchiveError::FileMissing(rf.name.clone()))?;

    let mut bad = Vec::new();
    for (local_index, expected_md5) in rf.slice_md5s.iter().enumerate() {
        let mut buf = vec![0u8; slice_size];
        read_padded_slice(&mut file, &mut buf)?;

        // Fast CRC32 pre-screen before the more expensive MD5 comparison.
        let crc_ok = rf
            .slice_crc32s
            .get(local_index)
            .map(|&expected| compute_crc32(&buf) == expected)
            .unwrap_or(true);
        if !crc_ok || compute_md5_bytes(&buf) != *expected_md5 {
            bad.push(file_start + local_index);
        }
    }
    Ok(bad)
}
