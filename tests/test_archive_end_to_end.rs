//! End-to-end exercise of the archive engine: scan a hand-built PAR2 file,
//! then repair a damaged data file using the recovery slice the scanner
//! found in it (streamed by byte offset, not loaded into memory).

use md5::{Digest, Md5};
use par2rs::archive::{from_files, repair};
use par2rs::packets::header::{HEADER_LEN, MAGIC};
use par2rs::packets::{file_description_packet, file_slice_checksum_packet, main_packet, recovery_slice_packet};
use std::io::Write;
use tempfile::{tempdir, NamedTempFile};

fn write_packet(buf: &mut Vec<u8>, type_of_packet: &[u8; 16], payload: &[u8]) {
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
    buf.extend_from_slice(type_of_packet);
    buf.extend_from_slice(payload);
}

#[test]
fn build_merges_packets_and_repairs_a_damaged_file() {
    let file_id = [9u8; 16];
    let slice_size = 4u64;

    // slice0 = [1,2,3,4], slice1 = [5,6,7,8]; recovery at exponent 0 is their
    // elementwise GF(2^16) sum (XOR of the little-endian u16 pairs), since
    // the Vandermonde row for exponent 0 is all-ones.
    let recovery_data: [u8; 4] = [4, 4, 4, 12];

    let mut data = Vec::new();

    let mut main_payload = Vec::new();
    main_payload.extend_from_slice(&slice_size.to_le_bytes());
    main_payload.extend_from_slice(&1u32.to_le_bytes());
    main_payload.extend_from_slice(&file_id);
    write_packet(&mut data, main_packet::TYPE_OF_PACKET, &main_payload);

    let mut fd_payload = Vec::new();
    fd_payload.extend_from_slice(&file_id);
    fd_payload.extend_from_slice(&[1u8; 16]);
    fd_payload.extend_from_slice(&[2u8; 16]);
    fd_payload.extend_from_slice(&8u64.to_le_bytes());
    fd_payload.extend_from_slice(b"data.bin\0\0\0\0");
    write_packet(&mut data, file_description_packet::TYPE_OF_PACKET, &fd_payload);

    let mut fsc_payload = Vec::new();
    fsc_payload.extend_from_slice(&file_id);
    for _ in 0..2 {
        fsc_payload.extend_from_slice(&[0u8; 16]);
        fsc_payload.extend_from_slice(&0u32.to_le_bytes());
    }
    write_packet(&mut data, file_slice_checksum_packet::TYPE_OF_PACKET, &fsc_payload);

    let mut rs_payload = Vec::new();
    rs_payload.extend_from_slice(&0u32.to_le_bytes()); // exponent
    rs_payload.extend_from_slice(&recovery_data);
    write_packet(&mut data, recovery_slice_packet::TYPE_OF_PACKET, &rs_payload);

    let mut par2_file = NamedTempFile::new().unwrap();
    par2_file.write_all(&data).unwrap();

    let archive = from_files(&[par2_file.path()]).unwrap();
    assert_eq!(archive.slice_size, slice_size);
    assert_eq!(archive.recovery_file_ids, vec![file_id]);

    let rf = archive.files.get(&file_id).unwrap();
    assert_eq!(rf.name, "data.bin");
    assert_eq!(rf.recovery_slices.len(), 1);
    assert_eq!(rf.recovery_slices[0].exponent, 0);

    let dir = tempdir().unwrap();
    let data_path = dir.path().join("data.bin");
    std::fs::write(&data_path, [1u8, 2, 3, 4, 0xFF, 0xFF, 0xFF, 0xFF]).unwrap();

    repair(&archive, dir.path(), &[1]).unwrap();

    let repaired = std::fs::read(&data_path).unwrap();
    assert_eq!(repaired, vec![1u8, 2, 3, 4, 5, 6, 7, 8]);
}
