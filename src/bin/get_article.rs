//! Fetches one Usenet article body, yEnc-decodes it, and writes the decoded
//! bytes to stdout.

use anyhow::{Context, Result};
use clap::{Arg, Command};
use par2rs::fetch::{ArticleSource, NntpArticleSource};
use par2rs::yenc::{YencReader, YencStatus};
use std::io::{BufReader, Cursor, Write};

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = Command::new("get-article")
        .about("Fetches and yEnc-decodes a single Usenet article")
        .arg(Arg::new("server").long("server").required(true).help("host:port of the NNTP server"))
        .arg(Arg::new("user").long("user").required(false).help("AUTHINFO USER"))
        .arg(Arg::new("password").long("password").required(false).help("AUTHINFO PASS"))
        .arg(Arg::new("message").long("message").required(true).help("Message-ID, without angle brackets"))
        .get_matches();

    let server = matches.get_one::<String>("server").expect("server is required by clap");
    let user = matches.get_one::<String>("user").map(String::as_str);
    let password = matches.get_one::<String>("password").map(String::as_str);
    let message = matches.get_one::<String>("message").expect("message is required by clap");

    let mut source = NntpArticleSource::connect(server, user, password)
        .with_context(|| format!("could not connect to {server}"))?;
    let raw = source.fetch(message).with_context(|| format!("fetching {message}"))?;

    let mut reader = YencReader::new(BufReader::new(Cursor::new(raw)));
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let mut buf = [0u8; 8192];
    loop {
        let (n, status) = reader.read(&mut buf).context("decoding yEnc body")?;
        out.write_all(&buf[..n]).context("writing to stdout")?;
        if matches!(status, YencStatus::End) {
            break;
        }
    }
    Ok(())
}
