//! The archive engine: builds an in-memory model of a PAR2 recovery set from
//! one or more `.par2` files, validates user files against it, and repairs
//! damaged ones via the Reed-Solomon solve in [`repair`].

pub mod build;
pub mod repair;
pub mod validate;

pub use build::from_files;
pub use repair::repair;
pub use validate::validate;

use crate::packets::RecoverySlicePacket;
use rustc_hash::FxHashMap as HashMap;
use std::fs::File;
use std::io::Read;

/// Metadata and checksums merged from every packet referencing one file ID,
/// mirroring the `recoveryFile` record of the reference implementation.
#[derive(Debug, Clone, Default)]
pub struct RecoveryFile {
    pub file_id: [u8; 16],
    pub name: String,
    pub file_length: u64,
    pub md5_full: [u8; 16],
    pub md5_16k: [u8; 16],
    pub slice_md5s: Vec<[u8; 16]>,
    pub slice_crc32s: Vec<u32>,
    pub recovery_slices: Vec<RecoverySlicePacket>,
}

/// The in-memory model of a PAR2 recovery set, built by scanning every
/// `.par2` file belonging to it.
#[derive(Debug, Default)]
pub struct Archive {
    pub slice_size: u64,
    pub recovery_file_ids: Vec<[u8; 16]>,
    pub non_recovery_file_ids: Vec<[u8; 16]>,
    pub files: HashMap<[u8; 16], RecoveryFile>,
    pub creator: Option<String>,
}

/// Reads up to `buf.len()` bytes from `file`, zero-padding any shortfall
/// (PAR2 treats a trailing short slice as virtually padded with zeros).
pub(crate) fn read_padded_slice(file: &mut File, buf: &mut [u8]) -> std::io::Result<()> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    for b in &mut buf[filled..] {
        *b = 0;
    }
    Ok(())
}

/// Interprets a byte slice as little-endian `u16` GF(2^16) elements. Per the
/// design note in spec.md §9, slices are decoded explicitly element-by-element
/// rather than reinterpreted via a raw memory cast.
pub(crate) fn bytes_to_u16_le(bytes: &[u8]) -> Vec<u16> {
    bytes
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect()
}

/// Inverse of [`bytes_to_u16_le`]: packs `u16` elements back into `len` bytes.
pub(crate) fn u16_le_to_bytes(elements: &[u16], len: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(len);
    for &e in elements {
        out.extend_from_slice(&e.to_le_bytes());
    }
    out.truncate(len);
    out
}
