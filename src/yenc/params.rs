//! key=value parsing for `=ybegin` / `=ypart` / `=yend` lines.

use super::types::{YencEnd, YencHeader, YencPart};
use crate::error::YencError;
use std::collections::HashMap;

pub(crate) fn parse_ybegin(line: &str) -> Result<YencHeader, YencError> {
    let rest = line
        .strip_prefix("=ybegin")
        .ok_or_else(|| YencError::BadHeader(line.to_string()))?
        .trim_start();

    let (kv_part, name) = split_name_param(rest, line)?;
    let params = parse_params(kv_part);

    let line_len = params
        .get("line")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| YencError::BadHeader(format!("missing 'line' in: {line}")))?;
    let size = params
        .get("size")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| YencError::BadHeader(format!("missing 'size' in: {line}")))?;
    let part = params.get("part").and_then(|s| s.parse().ok());
    let total = params.get("total").and_then(|s| s.parse().ok());

    Ok(YencHeader {
        line: line_len,
        size,
        name,
        part,
        total,
    })
}

pub(crate) fn parse_ypart(line: &str) -> Result<YencPart, YencError> {
    let rest = line
        .strip_prefix("=ypart")
        .ok_or_else(|| YencError::BadHeader(line.to_string()))?
        .trim_start();
    let params = parse_params(rest);

    let begin = params
        .get("begin")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| YencError::BadHeader(format!("missing 'begin' in: {line}")))?;
    let end = params
        .get("end")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| YencError::BadHeader(format!("missing 'end' in: {line}")))?;

    Ok(YencPart { begin, end })
}

pub(crate) fn parse_yend(line: &str) -> Result<YencEnd, YencError> {
    let rest = line
        .strip_prefix("=yend")
        .ok_or_else(|| YencError::BadHeader(line.to_string()))?
        .trim_start();
    let params = parse_params(rest);

    let size = params
        .get("size")
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| YencError::BadHeader(format!("missing 'size' in: {line}")))?;
    let crc32 = params
        .get("crc32")
        .and_then(|s| u32::from_str_radix(s, 16).ok());
    let pcrc32 = params
        .get("pcrc32")
        .and_then(|s| u32::from_str_radix(s, 16).ok());

    Ok(YencEnd { size, crc32, pcrc32 })
}

/// Splits a `=ybegin` remainder into its `key=value` prefix and trailing
/// `name=` value. `name` is always the last field and may itself contain
/// spaces, so it takes the rest of the line rather than one whitespace token.
fn split_name_param<'a>(rest: &'a str, whole_line: &str) -> Result<(&'a str, String), YencError> {
    match rest.find("name=") {
        Some(idx) => {
            let (kv_part, name_part) = rest.split_at(idx);
            Ok((kv_part, name_part["name=".len()..].to_string()))
        }
        None => Err(YencError::BadHeader(format!(
            "missing 'name' in: {whole_line}"
        ))),
    }
}

fn parse_params(text: &str) -> HashMap<&str, &str> {
    text.split_whitespace()
        .filter_map(|token| token.split_once('='))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_single_part_header() {
        let header = parse_ybegin("=ybegin line=128 size=189463 name=testfile.txt").unwrap();
        assert_eq!(header.line, 128);
        assert_eq!(header.size, 189463);
        assert_eq!(header.name, "testfile.txt");
        assert_eq!(header.part, None);
    }

    #[test]
    fn parses_multipart_header_with_spaces_in_name() {
        let header =
            parse_ybegin("=ybegin part=1 total=4 line=128 size=1000000 name=my movie.rar")
                .unwrap();
        assert_eq!(header.part, Some(1));
        assert_eq!(header.total, Some(4));
        assert_eq!(header.name, "my movie.rar");
    }

    #[test]
    fn parses_part_and_trailer() {
        let part = parse_ypart("=ypart begin=11251 end=22500").unwrap();
        assert_eq!(part.begin, 11251);
        assert_eq!(part.end, 22500);

        let end = parse_yend("=yend size=11250 crc32=DEADBEEF").unwrap();
        assert_eq!(end.size, 11250);
        assert_eq!(end.crc32, Some(0xDEADBEEF));
    }
}
