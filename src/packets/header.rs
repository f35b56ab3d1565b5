//! The fixed 64-byte PAR2 packet header.

/// Magic sequence every PAR2 packet starts with.
pub const MAGIC: [u8; 8] = *b"PAR2\0PKT";

/// Size in bytes of the fixed packet header (magic, length, md5, set id, type).
pub const HEADER_LEN: usize = 64;

/// A parsed, still-unverified packet header.
#[derive(Debug, Clone)]
pub struct PacketHeader {
    /// Total packet length in bytes, inclusive of this 64-byte header.
    pub length: u64,
    /// MD5 over `set_id || type_of_packet || payload`.
    pub md5: [u8; 16],
    pub set_id: [u8; 16],
    pub type_of_packet: [u8; 16],
}

impl PacketHeader {
    pub fn payload_len(&self) -> Option<u64> {
        self.length.checked_sub(HEADER_LEN as u64)
    }

    /// Parses a header from exactly [`HEADER_LEN`] bytes, magic bytes included.
    pub fn parse(bytes: &[u8; HEADER_LEN]) -> Self {
        let length = u64::from_le_bytes(bytes[8..16].try_into().unwrap());
        let md5 = bytes[16..32].try_into().unwrap();
        let set_id = bytes[32..48].try_into().unwrap();
        let type_of_packet = bytes[48..64].try_into().unwrap();
        Self {
            length,
            md5,
            set_id,
            type_of_packet,
        }
    }
}
