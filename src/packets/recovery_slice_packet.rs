//! The PAR2 RecoverySlice packet.
//!
//! Recovery data is typically megabytes per slice, so the scanner never
//! loads it into memory: a [`RecoverySlicePacket`] only remembers where the
//! bytes live (source file + byte offset) so the repair engine can read or
//! memory-map them on demand.

use std::path::PathBuf;

pub const TYPE_OF_PACKET: &[u8; 16] = b"PAR 2.0\0RecvSlic";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoverySlicePacket {
    /// Row index (0-based) this slice occupies in the PAR2 Vandermonde matrix;
    /// exponent 0 is the all-ones row.
    pub exponent: u32,
    /// The PAR2 volume file the recovery bytes live in.
    pub source_path: PathBuf,
    /// Byte offset of the recovery data within `source_path`.
    pub data_offset: u64,
    /// Length of the recovery data in bytes (equal to the archive's slice size).
    pub data_len: u64,
}

impl RecoverySlicePacket {
    /// Parses the fixed-size prefix (the exponent) from the payload. The
    /// caller is responsible for recording where the remaining bytes live.
    pub fn parse_exponent(payload_prefix: &[u8; 4]) -> u32 {
        u32::from_le_bytes(*payload_prefix)
    }
}
