//! par2rs - Usenet article retrieval and PAR2 repair engine
//!
//! Decodes yEnc-encoded Usenet articles, scans and merges PAR2 recovery
//! sets, and reconstructs damaged files via Reed-Solomon over GF(2^16),
//! using the Vandermonde polynomial 0x1100B (x¹⁶ + x¹² + x³ + x + 1)
//! mandated by the PAR2 specification for cross-compatibility with other
//! PAR2 clients.

pub mod archive;
pub mod checksum;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod galois;
pub mod matrix;
pub mod nzb;
pub mod packets;
pub mod yenc;

pub use archive::{Archive, RecoveryFile};
pub use error::{ArchiveError, FetchError, YencError};
