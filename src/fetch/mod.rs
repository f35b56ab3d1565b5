//! Worker-pool fetch pipeline: retrieves article bodies over an
//! [`ArticleSource`], yEnc-decodes them, and writes the decoded bytes to
//! their target file at the right offset.
//!
//! Mirrors the channel-based worker shape of the reference NNTP client's
//! `Worker.Work` loop, but sharded by target file rather than a single
//! shared request channel, so that no two workers ever write to the same
//! file concurrently.

use crate::error::FetchError;
use crate::yenc::{YencReader, YencStatus};
use std::collections::hash_map::DefaultHasher;
use std::fs::OpenOptions;
use std::hash::{Hash, Hasher};
use std::io::{BufReader, Cursor, Seek, SeekFrom, Write};
use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

pub mod nntp_client;
pub use nntp_client::NntpArticleSource;

/// Tuning knobs for a fetch run.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub worker_count: usize,
    pub connect_timeout: Duration,
    pub use_tls: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            worker_count: 4,
            connect_timeout: Duration::from_secs(10),
            use_tls: true,
        }
    }
}

/// One article to retrieve and where its decoded payload belongs. The byte
/// offset within `target_path` is not known until the article's yEnc header
/// is parsed (`=ypart begin=`), so it is not part of the job itself.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub message_id: String,
    pub target_path: PathBuf,
}

/// The NNTP transport seam: anything that can hand back an article body by
/// message ID. A real client is an external collaborator (out of scope);
/// tests substitute an in-memory mock.
pub trait ArticleSource: Send {
    fn fetch(&mut self, message_id: &str) -> Result<Vec<u8>, FetchError>;
}

/// Runs every job in `jobs` across `config.worker_count` worker threads,
/// each owning its own `ArticleSource` built by `make_source`. Returns
/// `Err(FetchError::PartialFailure)` if any job failed, after every other
/// job has still been attempted.
pub fn run<F, S>(jobs: Vec<FetchJob>, config: &FetchConfig, make_source: F) -> Result<(), FetchError>
where
    F: Fn() -> Result<S, FetchError> + Send + Sync + 'static,
    S: ArticleSource + 'static,
{
    let worker_count = config.worker_count.max(1);
    let mut shards: Vec<Vec<FetchJob>> = (0..worker_count).map(|_| Vec::new()).collect();
    for job in jobs {
        let shard = shard_for(&job.target_path, worker_count);
        shards[shard].push(job);
    }

    let make_source = Arc::new(make_source);
    let (result_tx, result_rx) = mpsc::channel::<Result<(), FetchError>>();
    let mut handles = Vec::with_capacity(worker_count);

    for shard in shards {
        let make_source = Arc::clone(&make_source);
        let result_tx = result_tx.clone();
        handles.push(thread::spawn(move || {
            let mut source = match make_source() {
                Ok(s) => s,
                Err(e) => {
                    for _ in 0..shard.len().max(1) {
                        let _ = result_tx.send(Err(FetchError::ConnectFailed(e.to_string())));
                    }
                    return;
                }
            };
            for job in shard {
                let _ = result_tx.send(fetch_and_decode(source.as_mut(), &job));
            }
        }));
    }
    drop(result_tx);

    let mut total = 0usize;
    let mut failed = 0usize;
    for result in result_rx {
        total += 1;
        if let Err(err) = result {
            log::warn!("article fetch failed: {err}");
            failed += 1;
        }
    }
    for handle in handles {
        let _ = handle.join();
    }

    if failed > 0 {
        return Err(FetchError::PartialFailure { failed, total });
    }
    Ok(())
}

fn fetch_and_decode(source: &mut dyn ArticleSource, job: &FetchJob) -> Result<(), FetchError> {
    let raw = source.fetch(&job.message_id)?;

    let mut reader = YencReader::new(BufReader::new(Cursor::new(raw)));
    let offset = reader.offset()?;
    let mut decoded = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        let (n, status) = reader.read(&mut buf)?;
        decoded.extend_from_slice(&buf[..n]);
        if matches!(status, YencStatus::End) {
            break;
        }
    }

    let mut file = OpenOptions::new()
        .create(true)
        .write(true)
        .open(&job.target_path)?;
    file.seek(SeekFrom::Start(offset))?;
    file.write_all(&decoded)?;
    Ok(())
}

fn shard_for(path: &std::path::Path, worker_count: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    (hasher.finish() as usize) % worker_count
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct MockSource {
        articles: Arc<HashMap<String, Vec<u8>>>,
    }

    impl ArticleSource for MockSource {
        fn fetch(&mut self, message_id: &str) -> Result<Vec<u8>, FetchError> {
            self.articles
                .get(message_id)
                .cloned()
                .ok_or_else(|| FetchError::FetchFailed(format!("unknown message id {message_id}")))
        }
    }

    fn yenc_article(payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(format!("=ybegin line=128 size={} name=out.bin\r\n", payload.len()).as_bytes());
        for &b in payload {
            let encoded = b.wrapping_add(42);
            match encoded {
                0x00 | 0x0A | 0x0D | 0x3D => {
                    data.push(b'=');
                    data.push(encoded.wrapping_add(64));
                }
                _ => data.push(encoded),
            }
        }
        data.extend_from_slice(b"\r\n");
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(payload);
        data.extend_from_slice(format!("=yend size={} crc32={:08x}\r\n", payload.len(), hasher.finalize()).as_bytes());
        data
    }

    /// Builds a multipart yEnc article for `payload`, declaring the part as
    /// spanning `[begin, end)` (1-based, end-exclusive) of a `total_size`
    /// file, the way a real multi-segment upload does.
    fn yenc_article_part(total_size: usize, begin: usize, end: usize, payload: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(
            format!("=ybegin part=1 total=2 line=128 size={total_size} name=out.bin\r\n").as_bytes(),
        );
        data.extend_from_slice(format!("=ypart begin={begin} end={end}\r\n").as_bytes());
        for &b in payload {
            let encoded = b.wrapping_add(42);
            match encoded {
                0x00 | 0x0A | 0x0D | 0x3D => {
                    data.push(b'=');
                    data.push(encoded.wrapping_add(64));
                }
                _ => data.push(encoded),
            }
        }
        data.extend_from_slice(b"\r\n");
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(payload);
        data.extend_from_slice(
            format!("=yend size={} pcrc32={:08x}\r\n", payload.len(), hasher.finalize()).as_bytes(),
        );
        data
    }

    #[test]
    fn multipart_segments_land_at_their_decoded_offset_not_a_precomputed_one() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.bin");

        let mut articles = HashMap::new();
        // "HelloWorld" split into two 5-byte segments; the yEnc `=ypart`
        // offsets (0 and 5) are what must place the bytes correctly, not any
        // byte count derived from the segments' encoded NZB sizes.
        articles.insert(
            "part1@example.com".to_string(),
            yenc_article_part(10, 1, 6, b"Hello"),
        );
        articles.insert(
            "part2@example.com".to_string(),
            yenc_article_part(10, 6, 11, b"World"),
        );
        let articles = Arc::new(articles);

        let jobs = vec![
            FetchJob { message_id: "part1@example.com".to_string(), target_path: target.clone() },
            FetchJob { message_id: "part2@example.com".to_string(), target_path: target.clone() },
        ];

        let config = FetchConfig { worker_count: 1, ..Default::default() };
        let result = run(jobs, &config, move || {
            Ok(MockSource { articles: Arc::clone(&articles) })
        });
        result.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"HelloWorld");
    }

    #[test]
    fn fetches_and_decodes_into_target_file() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("out.bin");

        let mut articles = HashMap::new();
        articles.insert("msg1@example.com".to_string(), yenc_article(b"hello"));
        let articles = Arc::new(articles);

        let jobs = vec![FetchJob {
            message_id: "msg1@example.com".to_string(),
            target_path: target.clone(),
        }];

        let config = FetchConfig { worker_count: 1, ..Default::default() };
        let result = run(jobs, &config, move || {
            Ok(MockSource { articles: Arc::clone(&articles) })
        });
        result.unwrap();

        assert_eq!(std::fs::read(&target).unwrap(), b"hello");
    }

    #[test]
    fn reports_partial_failure() {
        let dir = tempdir().unwrap();
        let articles = Arc::new(HashMap::new());

        let jobs = vec![FetchJob {
            message_id: "missing@example.com".to_string(),
            target_path: dir.path().join("out.bin"),
        }];

        let config = FetchConfig { worker_count: 1, ..Default::default() };
        let result = run(jobs, &config, move || {
            Ok(MockSource { articles: Arc::clone(&articles) })
        });
        assert!(matches!(result, Err(FetchError::PartialFailure { failed: 1, total: 1 })));
    }

    #[test]
    fn same_file_jobs_land_on_one_shard() {
        let path = PathBuf::from("/tmp/shared.bin");
        let a = shard_for(&path, 8);
        let b = shard_for(&path, 8);
        assert_eq!(a, b);
        let _ = Mutex::new(());
    }
}
