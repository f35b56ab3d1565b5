//! The PAR2 FileDescription packet: identity and checksums of one input file.

pub const TYPE_OF_PACKET: &[u8; 16] = b"PAR 2.0\0FileDesc";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptionPacket {
    pub file_id: [u8; 16],
    pub md5_full: [u8; 16],
    pub md5_16k: [u8; 16],
    pub file_length: u64,
    pub file_name: String,
}

impl FileDescriptionPacket {
    pub fn parse(payload: &[u8]) -> Option<Self> {
        if payload.len() < 56 {
            return None;
        }
        let file_id = payload[0..16].try_into().ok()?;
        let md5_full = payload[16..32].try_into().ok()?;
        let md5_16k = payload[32..48].try_into().ok()?;
        let file_length = u64::from_le_bytes(payload[48..56].try_into().ok()?);
        let name_bytes = &payload[56..];
        let trimmed = trim_nul(name_bytes);
        let file_name = String::from_utf8_lossy(trimmed).into_owned();

        Some(Self {
            file_id,
            md5_full,
            md5_16k,
            file_length,
            file_name,
        })
    }
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}
