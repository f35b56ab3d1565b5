//! Streaming scanner for PAR2 packet streams.
//!
//! Frames packets by the fixed 64-byte header (magic + length + md5 + set id
//! + type), dispatches on the 16-byte type field, and tolerates both unknown
//! packet types and corrupt packets (by resynchronising on the next magic
//! sequence) rather than aborting the whole scan.

pub mod creator_packet;
pub mod file_description_packet;
pub mod file_slice_checksum_packet;
pub mod header;
pub mod main_packet;
pub mod recovery_slice_packet;

pub use creator_packet::CreatorPacket;
pub use file_description_packet::FileDescriptionPacket;
pub use file_slice_checksum_packet::{FileSliceChecksumPacket, SliceChecksum};
pub use main_packet::MainPacket;
pub use recovery_slice_packet::RecoverySlicePacket;

use header::{PacketHeader, HEADER_LEN, MAGIC};
use md5::{Digest, Md5};
use std::collections::VecDeque;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScannerError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("expected PAR2 magic sequence, found something else")]
    BadMagic,
    #[error("packet failed MD5 verification")]
    CorruptPacket,
    #[error("packet of type {0:?} has a malformed payload")]
    MalformedPayload([u8; 16]),
}

/// A parsed PAR2 packet. `Unknown` packets are tolerated, not an error, per
/// the PAR2 specification's forward-compatibility requirement.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    Main(MainPacket),
    FileDescription(FileDescriptionPacket),
    FileSliceChecksum(FileSliceChecksumPacket),
    RecoverySlice(RecoverySlicePacket),
    Creator(CreatorPacket),
    Unknown([u8; 16]),
}

/// Streaming, resynchronising PAR2 packet scanner.
///
/// Call [`Scanner::next`] (or iterate directly, since `Scanner` implements
/// [`Iterator`]) until it returns `None`. A `CorruptPacket` error is yielded
/// exactly once per corruption and scanning continues from the next magic
/// sequence. `Io` and `BadMagic` are unrecoverable: once yielded, the
/// iterator is done.
pub struct Scanner<R> {
    reader: R,
    source_path: PathBuf,
    verify: bool,
    done: bool,
}

impl<R: Read + Seek> Scanner<R> {
    pub fn new(reader: R, source_path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            source_path: source_path.into(),
            verify: false,
            done: false,
        }
    }

    /// Enables MD5 verification of every packet's header+payload (required
    /// for "verify mode" per the scanner's contract).
    pub fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Reads the next 64-byte header, including the magic check.
    ///
    /// Returns `Ok(None)` on a clean end of stream (zero or a partial 1-7
    /// byte read of the magic), `Err(BadMagic)` if 8 bytes were read but
    /// don't match, and the parsed header otherwise.
    fn read_header(&mut self) -> Result<Option<PacketHeader>, ScannerError> {
        let mut magic_buf = [0u8; 8];
        let mut filled = 0;
        while filled < 8 {
            let n = self.reader.read(&mut magic_buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled < 8 {
            return Ok(None);
        }
        if magic_buf != MAGIC {
            return Err(ScannerError::BadMagic);
        }

        let mut rest = [0u8; HEADER_LEN];
        rest[..8].copy_from_slice(&magic_buf);
        self.reader.read_exact(&mut rest[8..])?;
        Ok(Some(PacketHeader::parse(&rest)))
    }

    /// Searches forward from the current position for the next magic
    /// sequence, leaving the reader positioned right before it. Returns
    /// `false` if the stream ends before one is found.
    fn resync(&mut self) -> io::Result<bool> {
        let mut window: VecDeque<u8> = VecDeque::with_capacity(8);
        let mut byte = [0u8; 1];
        loop {
            let n = self.reader.read(&mut byte)?;
            if n == 0 {
                return Ok(false);
            }
            if window.len() == 8 {
                window.pop_front();
            }
            window.push_back(byte[0]);
            if window.len() == 8 && window.iter().copied().eq(MAGIC.iter().copied()) {
                self.reader.seek(SeekFrom::Current(-8))?;
                return Ok(true);
            }
        }
    }

    fn verify_checksum(&self, header: &PacketHeader, payload: &[u8]) -> bool {
        let mut hasher = Md5::new();
        hasher.update(header.set_id);
        hasher.update(header.type_of_packet);
        hasher.update(payload);
        let computed: [u8; 16] = hasher.finalize().into();
        computed == header.md5
    }

    fn dispatch(&mut self, header: PacketHeader) -> Result<Packet, ScannerError> {
        let payload_len = header
            .payload_len()
            .ok_or(ScannerError::MalformedPayload(header.type_of_packet))?;

        if header.type_of_packet == *recovery_slice_packet::TYPE_OF_PACKET && !self.verify {
            return self.dispatch_recovery_slice_streaming(&header, payload_len);
        }

        let mut payload = vec![0u8; payload_len as usize];
        self.reader.read_exact(&mut payload)?;

        if self.verify && !self.verify_checksum(&header, &payload) {
            return Err(ScannerError::CorruptPacket);
        }

        self.build_packet(&header, &payload)
    }

    fn dispatch_recovery_slice_streaming(
        &mut self,
        header: &PacketHeader,
        payload_len: u64,
    ) -> Result<Packet, ScannerError> {
        if payload_len < 4 {
            return Err(ScannerError::MalformedPayload(header.type_of_packet));
        }
        let mut exponent_bytes = [0u8; 4];
        self.reader.read_exact(&mut exponent_bytes)?;
        let exponent = RecoverySlicePacket::parse_exponent(&exponent_bytes);
        let data_offset = self.reader.stream_position()?;
        let data_len = payload_len - 4;
        self.reader.seek(SeekFrom::Current(data_len as i64))?;
        Ok(Packet::RecoverySlice(RecoverySlicePacket {
            exponent,
            source_path: self.source_path.clone(),
            data_offset,
            data_len,
        }))
    }

    fn build_packet(&self, header: &PacketHeader, payload: &[u8]) -> Result<Packet, ScannerError> {
        let malformed = || ScannerError::MalformedPayload(header.type_of_packet);
        match &header.type_of_packet {
            t if t == main_packet::TYPE_OF_PACKET => {
                MainPacket::parse(payload).map(Packet::Main).ok_or_else(malformed)
            }
            t if t == file_description_packet::TYPE_OF_PACKET => {
                FileDescriptionPacket::parse(payload)
                    .map(Packet::FileDescription)
                    .ok_or_else(malformed)
            }
            t if t == file_slice_checksum_packet::TYPE_OF_PACKET => {
                FileSliceChecksumPacket::parse(payload)
                    .map(Packet::FileSliceChecksum)
                    .ok_or_else(malformed)
            }
            t if t == recovery_slice_packet::TYPE_OF_PACKET => {
                // Only reached in verify mode, where the payload is already
                // fully in memory for the MD5 check above.
                if payload.len() < 4 {
                    return Err(malformed());
                }
                let exponent_bytes: [u8; 4] = payload[0..4].try_into().unwrap();
                let exponent = RecoverySlicePacket::parse_exponent(&exponent_bytes);
                Ok(Packet::RecoverySlice(RecoverySlicePacket {
                    exponent,
                    source_path: self.source_path.clone(),
                    data_offset: 0,
                    data_len: (payload.len() - 4) as u64,
                }))
            }
            t if t == creator_packet::TYPE_OF_PACKET => {
                Ok(Packet::Creator(CreatorPacket::parse(payload)))
            }
            other => Ok(Packet::Unknown(*other)),
        }
    }
}

impl<R: Read + Seek> Iterator for Scanner<R> {
    type Item = Result<Packet, ScannerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let header = match self.read_header() {
                Ok(Some(h)) => h,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            match self.dispatch(header) {
                Ok(packet) => return Some(Ok(packet)),
                Err(ScannerError::CorruptPacket) => match self.resync() {
                    Ok(true) => return Some(Err(ScannerError::CorruptPacket)),
                    Ok(false) => {
                        self.done = true;
                        return Some(Err(ScannerError::CorruptPacket));
                    }
                    Err(e) => {
                        self.done = true;
                        return Some(Err(e.into()));
                    }
                },
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
