//! Hashing utilities for PAR2 slice verification.
//!
//! The archive engine checks every slice against both a CRC32 (fast
//! pre-screen) and an MD5 (authoritative) as recorded in a FileSliceChecksum
//! packet, so only those two primitives are exposed here.

use crate::domain::Crc32Value;

/// Compute MD5 hash of data as raw bytes, matching the PAR2 packet wire
/// format's 16-byte MD5 fields.
#[inline]
pub fn compute_md5_bytes(data: &[u8]) -> [u8; 16] {
    use md5::{Digest, Md5};
    Md5::digest(data).into()
}

/// Compute CRC32 of already-padded slice data.
#[inline]
pub fn compute_crc32(data: &[u8]) -> Crc32Value {
    Crc32Value::new(crc32fast::hash(data))
}
