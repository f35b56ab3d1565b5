//! The PAR2 Main packet: slice size and the recovery set's file ID lists.

pub const TYPE_OF_PACKET: &[u8; 16] = b"PAR 2.0\0Main\0\0\0\0";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MainPacket {
    pub slice_size: u64,
    pub recovery_file_ids: Vec<[u8; 16]>,
    pub non_recovery_file_ids: Vec<[u8; 16]>,
}

impl MainPacket {
    /// Parses from the packet's payload (everything after the 64-byte header).
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < 12 {
            return None;
        }
        let slice_size = u64::from_le_bytes(payload[0..8].try_into().ok()?);
        let n = u32::from_le_bytes(payload[8..12].try_into().ok()?) as usize;

        let recovery_end = 12 + n * 16;
        if payload.len() < recovery_end {
            return None;
        }
        let recovery_file_ids = payload[12..recovery_end]
            .chunks_exact(16)
            .map(|c| c.try_into().unwrap())
            .collect();

        let non_recovery_file_ids = payload[recovery_end..]
            .chunks_exact(16)
            .map(|c| c.try_into().unwrap())
            .collect();

        Some(Self {
            slice_size,
            recovery_file_ids,
            non_recovery_file_ids,
        })
    }
}
