//! Streaming, pull-based yEnc decoder.

use super::params::{parse_yend, parse_ybegin, parse_ypart};
use super::types::{YencHeader, YencPart, YencStatus};
use crate::error::YencError;
use crc32fast::Hasher;
use std::io::BufRead;

#[derive(Debug, PartialEq, Eq)]
enum State {
    SeekHeader,
    Body,
    End,
}

/// Decodes a yEnc stream one pull at a time: each [`read`](YencReader::read)
/// call fills as much of the caller's buffer as the currently available
/// input allows, carrying any undecoded remainder of a line across calls.
pub struct YencReader<R> {
    lines: R,
    state: State,
    header: Option<YencHeader>,
    part: Option<YencPart>,
    multipart: bool,
    offset: u64,
    declared_size: u64,
    overflow: Option<Vec<u8>>,
    crc: Hasher,
}

impl<R: BufRead> YencReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            lines: inner,
            state: State::SeekHeader,
            header: None,
            part: None,
            multipart: false,
            offset: 0,
            declared_size: 0,
            overflow: None,
            crc: Hasher::new(),
        }
    }

    /// The original filename declared by the `=ybegin` header.
    pub fn filename(&mut self) -> Result<&str, YencError> {
        self.ensure_header()?;
        Ok(&self.header.as_ref().unwrap().name)
    }

    /// Byte offset at which this part's payload begins in the reassembled
    /// file (`0` for single-part articles).
    pub fn offset(&mut self) -> Result<u64, YencError> {
        self.ensure_header()?;
        Ok(self.offset)
    }

    pub fn multipart(&mut self) -> Result<bool, YencError> {
        self.ensure_header()?;
        Ok(self.multipart)
    }

    /// Fills `buf` with up to `buf.len()` decoded bytes.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<(usize, YencStatus), YencError> {
        self.ensure_header()?;
        let mut written = 0;

        if let Some(remainder) = self.overflow.take() {
            written += self.decode_into(&remainder, &mut buf[written..]);
            if written == buf.len() {
                return Ok((written, YencStatus::Ok));
            }
        }

        loop {
            match self.state {
                State::End => return Ok((written, YencStatus::End)),
                State::Body => match self.next_line()? {
                    None => {
                        self.state = State::End;
                        return Ok((written, YencStatus::End));
                    }
                    Some(line) => {
                        if line.starts_with(b"=yend") {
                            self.finish_part(&line)?;
                            self.state = State::SeekHeader;
                            if !self.seek_next_header()? {
                                self.state = State::End;
                                return Ok((written, YencStatus::End));
                            }
                            continue;
                        }
                        written += self.decode_into(&line, &mut buf[written..]);
                        if written == buf.len() {
                            return Ok((written, YencStatus::Ok));
                        }
                    }
                },
                State::SeekHeader => {
                    if !self.seek_next_header()? {
                        self.state = State::End;
                        return Ok((written, YencStatus::End));
                    }
                }
            }
        }
    }

    /// Reads and discards lines until `=ybegin ` is found, or returns
    /// `Ok(false)` on a clean end of stream. Used both for the first header
    /// and to tolerate additional parts concatenated in the same stream.
    fn seek_next_header(&mut self) -> Result<bool, YencError> {
        loop {
            match self.next_line()? {
                None => return Ok(false),
                Some(line) if line.starts_with(b"=ybegin") => {
                    self.parse_header_lines(&line)?;
                    self.state = State::Body;
                    return Ok(true);
                }
                Some(_) => continue,
            }
        }
    }

    fn ensure_header(&mut self) -> Result<(), YencError> {
        if self.header.is_some() {
            return Ok(());
        }
        if !self.seek_next_header()? {
            return Err(YencError::MissingHeader);
        }
        Ok(())
    }

    fn parse_header_lines(&mut self, ybegin_line: &[u8]) -> Result<(), YencError> {
        let text = decode_ascii_line(ybegin_line)?;
        let header = parse_ybegin(&text)?;

        if header.part.is_some() {
            let part_line = self
                .next_line()?
                .ok_or_else(|| YencError::BadHeader("stream ended before =ypart".into()))?;
            let part_text = decode_ascii_line(&part_line)?;
            if !part_text.starts_with("=ypart") {
                return Err(YencError::BadHeader(format!(
                    "expected =ypart, found: {part_text}"
                )));
            }
            let part = parse_ypart(&part_text)?;
            self.multipart = true;
            self.offset = part.begin.saturating_sub(1);
            self.declared_size = part.end.saturating_sub(part.begin);
            self.part = Some(part);
        } else {
            self.multipart = false;
            self.offset = 0;
            self.declared_size = header.size;
            self.part = None;
        }

        self.header = Some(header);
        self.crc = Hasher::new();
        Ok(())
    }

    fn finish_part(&mut self, yend_line: &[u8]) -> Result<(), YencError> {
        let text = decode_ascii_line(yend_line)?;
        let footer = parse_yend(&text)?;

        let declared_size = self.declared_size;
        if footer.size != declared_size {
            return Err(YencError::SizeMismatch {
                expected: declared_size,
                actual: footer.size,
            });
        }

        let expected_crc = footer.crc32.or(footer.pcrc32);
        if let Some(expected) = expected_crc {
            let actual = std::mem::replace(&mut self.crc, Hasher::new()).finalize();
            if actual != expected {
                return Err(YencError::CrcMismatch { expected, actual });
            }
        }
        Ok(())
    }

    /// Decodes `input` (one raw line) into `output`, returning the number of
    /// bytes written. Any undecoded suffix of `input` that didn't fit is
    /// stashed in `self.overflow` for the next call.
    fn decode_into(&mut self, input: &[u8], output: &mut [u8]) -> usize {
        let mut out_i = 0;
        let mut escape_next = false;
        let mut idx = 0;
        while idx < input.len() {
            let mut b = input[idx];
            if b == b'=' && !escape_next {
                escape_next = true;
                idx += 1;
                continue;
            }
            if escape_next {
                b = b.wrapping_sub(64);
                escape_next = false;
            }
            b = b.wrapping_sub(42);
            if out_i < output.len() {
                output[out_i] = b;
                out_i += 1;
                idx += 1;
            } else {
                self.overflow = Some(input[idx..].to_vec());
                self.crc.update(&output[..out_i]);
                return out_i;
            }
        }
        self.crc.update(&output[..out_i]);
        out_i
    }

    fn next_line(&mut self) -> Result<Option<Vec<u8>>, YencError> {
        let mut buf = Vec::new();
        let n = self.lines.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Ok(None);
        }
        while matches!(buf.last(), Some(b'\n') | Some(b'\r')) {
            buf.pop();
        }
        Ok(Some(buf))
    }
}

fn decode_ascii_line(line: &[u8]) -> Result<String, YencError> {
    std::str::from_utf8(line)
        .map(str::to_string)
        .map_err(|_| YencError::BadHeader("header line is not valid UTF-8".into()))
}
