//! Downloads every file described by an NZB index, fetching articles over a
//! pool of NNTP connections and yEnc-decoding them in place.

use anyhow::{Context, Result};
use clap::{Arg, Command};
use par2rs::fetch::{self, FetchConfig, FetchJob, NntpArticleSource};
use par2rs::nzb;
use std::path::PathBuf;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    let matches = Command::new("nzb-get")
        .about("Downloads the files described by an NZB index")
        .arg(Arg::new("server").long("server").required(true).help("host:port of the NNTP server"))
        .arg(Arg::new("user").long("user").required(false).help("AUTHINFO USER"))
        .arg(Arg::new("password").long("password").required(false).help("AUTHINFO PASS"))
        .arg(Arg::new("nzb").long("nzb").required(true).help("Path to the .nzb file"))
        .arg(
            Arg::new("connections")
                .long("connections")
                .required(false)
                .default_value("4")
                .help("Number of concurrent NNTP connections"),
        )
        .get_matches();

    let server = matches.get_one::<String>("server").expect("server is required by clap").clone();
    let user = matches.get_one::<String>("user").cloned();
    let password = matches.get_one::<String>("password").cloned();
    let nzb_path = matches.get_one::<String>("nzb").expect("nzb is required by clap");
    let connections: usize = matches
        .get_one::<String>("connections")
        .expect("connections has a default value")
        .parse()
        .context("--connections must be a number")?;

    let xml = std::fs::read_to_string(nzb_path).with_context(|| format!("reading {nzb_path}"))?;
    let files = nzb::parse(&xml).with_context(|| format!("parsing {nzb_path}"))?;

    let mut jobs = Vec::new();
    for file in &files {
        let target_path = PathBuf::from(file_name_from_subject(&file.subject));
        for segment in &file.segments {
            jobs.push(FetchJob {
                message_id: segment.message_id.clone(),
                target_path: target_path.clone(),
            });
        }
    }

    let config = FetchConfig { worker_count: connections.max(1), ..Default::default() };
    fetch::run(jobs, &config, move || {
        NntpArticleSource::connect(&server, user.as_deref(), password.as_deref())
    })
    .context("fetch pipeline failed")?;

    Ok(())
}

/// NZB subjects typically read like `"archive.rar (1/10) [01/20] - 123.45 MB yEnc"`;
/// the real filename (and the decoded byte offsets) come from the yEnc
/// headers inside each article, not the subject line, but as a best-effort
/// fallback for naming the output file we take the subject's first
/// whitespace-delimited token.
fn file_name_from_subject(subject: &str) -> String {
    subject
        .split_whitespace()
        .next()
        .unwrap_or("download.bin")
        .to_string()
}
