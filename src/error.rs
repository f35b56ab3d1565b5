//! Per-subsystem error taxonomy.
//!
//! Each subsystem that can fail independently gets its own `thiserror` enum;
//! the archive engine and fetch pipeline wrap the lower-level ones via
//! `#[from]` rather than flattening everything into one giant enum.

use crate::matrix::MatrixError;
use crate::packets::ScannerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum YencError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("stream ended before a =ybegin header was seen")]
    MissingHeader,
    #[error("malformed header or footer line: {0}")]
    BadHeader(String),
    #[error("decoded CRC32 {actual:08x} does not match declared {expected:08x}")]
    CrcMismatch { expected: u32, actual: u32 },
    #[error("decoded size {actual} does not match declared size {expected}")]
    SizeMismatch { expected: u64, actual: u64 },
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("authentication failed: {0}")]
    AuthFailed(String),
    #[error("could not connect to article server: {0}")]
    ConnectFailed(String),
    #[error("article fetch failed: {0}")]
    FetchFailed(String),
    #[error("article body failed to decode: {0}")]
    Yenc(#[from] YencError),
    #[error("{failed} of {total} articles failed")]
    PartialFailure { failed: usize, total: usize },
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("packet scan failed: {0}")]
    Scanner(#[from] ScannerError),
    #[error("recovery solve failed: {0}")]
    Matrix(#[from] MatrixError),
    #[error("file {0} referenced by the recovery set is missing")]
    FileMissing(String),
    #[error(
        "{file}: {bad} damaged slice(s) but only {available} recovery slice(s) available"
    )]
    Unrecoverable {
        file: String,
        bad: usize,
        available: usize,
    },
}
