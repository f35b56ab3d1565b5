//! The PAR2 FileSliceChecksum (IFSC) packet: per-slice MD5+CRC32 for one file.

pub const TYPE_OF_PACKET: &[u8; 16] = b"PAR 2.0\0IFSC\0\0\0\0";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliceChecksum {
    pub md5: [u8; 16],
    pub crc32: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSliceChecksumPacket {
    pub file_id: [u8; 16],
    pub slices: Vec<SliceChecksum>,
}

impl FileSliceChecksumPacket {
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < 16 {
            return None;
        }
        let file_id = payload[0..16].try_into().ok()?;
        let slices = payload[16..]
            .chunks_exact(20)
            .map(|chunk| SliceChecksum {
                md5: chunk[0..16].try_into().unwrap(),
                crc32: u32::from_le_bytes(chunk[16..20].try_into().unwrap()),
            })
            .collect();

        Some(Self { file_id, slices })
    }
}
