//! NZB index parsing: the XML segment list that points the fetch pipeline at
//! the Usenet articles making up a file.

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NzbError {
    #[error("xml parse error: {0}")]
    Xml(#[from] quick_xml::Error),
    #[error("malformed attribute value: {0}")]
    BadAttribute(String),
}

/// One article making up part of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NzbSegment {
    pub number: u32,
    pub bytes: u64,
    pub message_id: String,
}

/// A single `<file>` entry: a subject line plus its ordered segments.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NzbFile {
    pub subject: String,
    pub segments: Vec<NzbSegment>,
}

/// Parses an NZB document, returning its files with segments sorted
/// ascending by `number` (the order the fetch pipeline should request them
/// in to reassemble the file).
pub fn parse(xml: &str) -> Result<Vec<NzbFile>, NzbError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut files = Vec::new();
    let mut current: Option<NzbFile> = None;
    let mut current_segment: Option<(u32, u64)> = None;
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) if e.name().as_ref() == b"file" => {
                let mut subject = String::new();
                for attr in e.attributes().flatten() {
                    if attr.key.as_ref() == b"subject" {
                        subject = attr
                            .unescape_value()
                            .map_err(|_| NzbError::BadAttribute("subject".into()))?
                            .into_owned();
                    }
                }
                current = Some(NzbFile { subject, segments: Vec::new() });
            }
            Event::Start(e) if e.name().as_ref() == b"segment" => {
                let mut number = 0u32;
                let mut bytes = 0u64;
                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value);
                    match attr.key.as_ref() {
                        b"number" => {
                            number = value
                                .parse()
                                .map_err(|_| NzbError::BadAttribute("number".into()))?
                        }
                        b"bytes" => {
                            bytes = value
                                .parse()
                                .map_err(|_| NzbError::BadAttribute("bytes".into()))?
                        }
                        _ => {}
                    }
                }
                current_segment = Some((number, bytes));
            }
            Event::Text(e) => {
                if let Some((number, bytes)) = current_segment.take() {
                    let message_id = e.unescape()?.trim().to_string();
                    if let Some(file) = current.as_mut() {
                        file.segments.push(NzbSegment { number, bytes, message_id });
                    }
                }
            }
            Event::End(e) if e.name().as_ref() == b"file" => {
                if let Some(mut file) = current.take() {
                    file.segments.sort_by_key(|s| s.number);
                    files.push(file);
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(files)
}
