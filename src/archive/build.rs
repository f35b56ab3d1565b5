//! Builds an [`Archive`] by scanning one or more PAR2 files and merging
//! their packets by file ID.

use super::{Archive, RecoveryFile};
use crate::error::ArchiveError;
use crate::packets::{Packet, Scanner};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Scans every path in `paths` and merges the packets found into a single
/// [`Archive`]. Later values overwrite earlier ones for the same file ID
/// (PAR2 broadcasts identical metadata across volumes for redundancy).
///
/// `RecoverySlice` packets carry no file ID on the wire (see spec.md §4.3),
/// so each one is attached to every file already known in the archive at the
/// point it is scanned — the resolution of the open question in DESIGN.md.
/// Scanning the base `.par2` index before its recovery volumes ensures file
/// descriptions are known before their recovery slices arrive.
pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Archive, ArchiveError> {
    let mut archive = Archive::default();

    for path in paths {
        let path = path.as_ref();
        let file = File::open(path).map_err(|_| {
            ArchiveError::FileMissing(path.display().to_string())
        })?;
        let scanner = Scanner::new(BufReader::new(file), path);

        for packet in scanner {
            match packet? {
                Packet::Main(main) => {
                    archive.slice_size = main.slice_size;
                    archive.recovery_file_ids = main.recovery_file_ids;
                    archive.non_recovery_file_ids = main.non_recovery_file_ids;
                }
                Packet::FileDescription(fd) => {
                    let entry = archive.files.entry(fd.file_id).or_default();
                    entry.file_id = fd.file_id;
                    entry.name = fd.file_name;
                    entry.file_length = fd.file_length;
                    entry.md5_full = fd.md5_full;
                    entry.md5_16k = fd.md5_16k;
                }
                Packet::FileSliceChecksum(fsc) => {
                    let entry = archive.files.entry(fsc.file_id).or_default();
                    entry.file_id = fsc.file_id;
                    entry.slice_md5s = fsc.slices.iter().map(|s| s.md5).collect();
                    entry.slice_crc32s = fsc.slices.iter().map(|s| s.crc32).collect();
                }
                Packet::RecoverySlice(rs) => {
                    for rf in archive.files.values_mut() {
                        rf.recovery_slices.push(rs.clone());
                    }
                }
                Packet::Creator(creator) => {
                    archive.creator = Some(creator.text);
                }
                Packet::Unknown(_) => {}
            }
        }
    }

    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::header::{HEADER_LEN, MAGIC};
    use md5::{Digest, Md5};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_packet(buf: &mut Vec<u8>, type_of_packet: [u8; 16], payload: &[u8]) {
        let set_id = [0u8; 16];
        let length = (HEADER_LEN + payload.len()) as u64;
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&length.to_le_bytes());
        let mut hasher = Md5::new();
        hasher.update(set_id);
        hasher.update(type_of_packet);
        hasher.update(payload);
        let md5: [u8; 16] = hasher.finalize().into();
        buf.extend_from_slice(&md5);
        buf.extend_from_slice(&set_id);
        buf.extend_from_slice(&type_of_packet);
        buf.extend_from_slice(payload);
    }

    #[test]
    fn merges_main_and_file_description_packets() {
        let file_id = [7u8; 16];
        let mut data = Vec::new();

        let mut main_payload = Vec::new();
        main_payload.extend_from_slice(&65536u64.to_le_bytes());
        main_payload.extend_from_slice(&1u32.to_le_bytes());
        main_payload.extend_from_slice(&file_id);
        write_packet(&mut data, *crate::packets::main_packet::TYPE_OF_PACKET, &main_payload);

        let mut fd_payload = Vec::new();
        fd_payload.extend_from_slice(&file_id);
        fd_payload.extend_from_slice(&[1u8; 16]);
        fd_payload.extend_from_slice(&[2u8; 16]);
        fd_payload.extend_from_slice(&1234u64.to_le_bytes());
        fd_payload.extend_from_slice(b"hello.txt\0\0\0");
        write_packet(
            &mut data,
            *crate::packets::file_description_packet::TYPE_OF_PACKET,
            &fd_payload,
        );

        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(&data).unwrap();

        let archive = from_files(&[tmp.path()]).unwrap();
        assert_eq!(archive.slice_size, 65536);
        assert_eq!(archive.recovery_file_ids, vec![file_id]);
        let rf = archive.files.get(&file_id).unwrap();
        assert_eq!(rf.name, "hello.txt");
        assert_eq!(rf.file_length, 1234);
    }
}
