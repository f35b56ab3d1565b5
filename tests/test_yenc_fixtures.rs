//! Decodes the on-disk yEnc fixtures under `tests/fixtures/yenc/`.

use par2rs::yenc::{YencReader, YencStatus};
use std::fs;
use std::io::BufReader;

fn decode_all(path: &str) -> Vec<u8> {
    let data = fs::read(path).unwrap();
    let mut reader = YencReader::new(BufReader::new(std::io::Cursor::new(data)));
    let mut decoded = Vec::new();
    let mut buf = [0u8; 64];
    loop {
        let (n, status) = reader.read(&mut buf).unwrap();
        decoded.extend_from_slice(&buf[..n]);
        if matches!(status, YencStatus::End) {
            break;
        }
    }
    decoded
}

#[test]
fn single_part_fixture_decodes_to_expected_bytes() {
    let decoded = decode_all("tests/fixtures/yenc/encoded.txt");
    let expected = fs::read("tests/fixtures/yenc/expected.txt").unwrap();
    assert_eq!(decoded, expected);
}

#[test]
fn multipart_fixture_decodes_to_expected_bytes() {
    let decoded = decode_all("tests/fixtures/yenc/encoded_multipart.txt");
    let expected = fs::read("tests/fixtures/yenc/expected_multipart.txt").unwrap();
    assert_eq!(decoded, expected);
}
