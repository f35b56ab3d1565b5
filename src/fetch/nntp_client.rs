//! A minimal synchronous NNTP client implementing [`ArticleSource`].
//!
//! Grounded in the reference implementation's `nntp.Conn` (`Dial`,
//! `Authenticate`, `ReadMessage` over `net/textproto`): connect, read the
//! greeting, optionally `AUTHINFO USER`/`AUTHINFO PASS`, then `BODY
//! <message-id>` per article. TLS is out of scope (the teacher crate pulls
//! in no TLS dependency and `nntp-rs`'s TLS stack is tokio-based, which
//! would drag in an async runtime this crate deliberately avoids — see
//! DESIGN.md), so `FetchConfig::use_tls` is accepted but only a plain TCP
//! connection is made.

use super::ArticleSource;
use crate::error::FetchError;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;

pub struct NntpArticleSource {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl NntpArticleSource {
    pub fn connect(address: &str, user: Option<&str>, password: Option<&str>) -> Result<Self, FetchError> {
        let stream = TcpStream::connect(address)
            .map_err(|e| FetchError::ConnectFailed(format!("{address}: {e}")))?;
        let writer = stream.try_clone().map_err(|e| FetchError::ConnectFailed(e.to_string()))?;
        let mut source = Self { reader: BufReader::new(stream), writer };

        let (code, text) = source.read_status_line()?;
        if !(200..300).contains(&code) {
            return Err(FetchError::ConnectFailed(format!("{code} {text}")));
        }

        if let (Some(user), Some(password)) = (user, password) {
            source.authenticate(user, password)?;
        }
        Ok(source)
    }

    fn send_command(&mut self, command: &str) -> Result<(), FetchError> {
        self.writer
            .write_all(format!("{command}\r\n").as_bytes())
            .map_err(FetchError::Io)
    }

    fn read_status_line(&mut self) -> Result<(u32, String), FetchError> {
        let mut line = String::new();
        self.reader.read_line(&mut line)?;
        let line = line.trim_end();
        let code: u32 = line
            .get(0..3)
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| FetchError::FetchFailed(format!("malformed status line: {line}")))?;
        Ok((code, line.get(4..).unwrap_or("").to_string()))
    }

    fn authenticate(&mut self, user: &str, password: &str) -> Result<(), FetchError> {
        self.send_command(&format!("AUTHINFO USER {user}"))?;
        let (code, text) = self.read_status_line()?;
        match code {
            281 => return Ok(()),
            381 => {}
            other => return Err(FetchError::AuthFailed(format!("{other} {text}"))),
        }

        self.send_command(&format!("AUTHINFO PASS {password}"))?;
        let (code, text) = self.read_status_line()?;
        if code != 281 {
            return Err(FetchError::AuthFailed(format!("{code} {text}")));
        }
        Ok(())
    }

    /// Reads a dot-stuffed multi-line body until the terminating `.\r\n`.
    fn read_dot_terminated(&mut self) -> Result<Vec<u8>, FetchError> {
        let mut body = Vec::new();
        loop {
            let mut line = Vec::new();
            let n = self.reader.read_until(b'\n', &mut line)?;
            if n == 0 {
                break;
            }
            if line == b".\r\n" || line == b".\n" {
                break;
            }
            let unstuffed = if line.starts_with(b"..") { &line[1..] } else { &line[..] };
            body.extend_from_slice(unstuffed);
        }
        Ok(body)
    }
}

impl ArticleSource for NntpArticleSource {
    fn fetch(&mut self, message_id: &str) -> Result<Vec<u8>, FetchError> {
        self.send_command(&format!("BODY <{message_id}>"))?;
        let (code, text) = self.read_status_line()?;
        if code != 222 {
            return Err(FetchError::FetchFailed(format!("{code} {text}")));
        }
        self.read_dot_terminated()
    }
}
