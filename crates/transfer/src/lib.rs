//! Chunked file reading and path resolution for DBFS uploads.
//!
//! DBFS accepts streamed writes as a sequence of `add-block` calls, each
//! carrying at most [`MAX_BLOCK_SIZE`] bytes. This crate plans those blocks,
//! reads them from disk, and resolves the local/remote paths involved.

mod chunked;
mod path;

pub use chunked::{Block, ChunkPlan, ChunkReader};
pub use path::{
    UploadMode, normalize, remote_parent, resolve_local_source, resolve_local_source_in,
    validate_remote_path,
};

/// Largest block accepted by a single `add-block` call.
///
/// The service rejects blocks of 1 MB and above; 900,000 bytes leaves
/// headroom for the base64 expansion and request envelope.
pub const MAX_BLOCK_SIZE: usize = 900_000;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid path: {0}")]
    InvalidPath(String),
}
