//! Upload error types.

use std::path::{Path, PathBuf};

use dbfs_transfer::TransferError;

use crate::store::StoreError;

/// Errors produced by the upload protocol and reconciler.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("invalid upload config: {0}")]
    InvalidConfig(String),

    #[error("local I/O error on {}: {source}", .path.display())]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {path} for writing: {source}")]
    Open {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to add block at offset {offset} to {path}: {source}")]
    Transfer {
        path: String,
        offset: u64,
        #[source]
        source: StoreError,
    },

    #[error("failed to close {path}: {source}")]
    Close {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("remote path not found: {0}")]
    NotFound(String),

    #[error("conflict on {path}: {source}")]
    Conflict {
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("{op} failed for {path}: {source}")]
    Remote {
        op: &'static str,
        path: String,
        #[source]
        source: StoreError,
    },

    #[error("cancelled")]
    Cancelled,
}

impl UploadError {
    /// Maps a store failure outside the open/append/close phases.
    pub(crate) fn from_store(op: &'static str, path: &str, source: StoreError) -> Self {
        match source {
            StoreError::NotFound(_) => Self::NotFound(path.to_string()),
            StoreError::Conflict(_) => Self::Conflict {
                path: path.to_string(),
                source,
            },
            source => Self::Remote {
                op,
                path: path.to_string(),
                source,
            },
        }
    }

    /// Maps a local transfer failure for `path`.
    pub(crate) fn from_transfer(path: &Path, err: TransferError) -> Self {
        match err {
            TransferError::Io(source) => Self::LocalIo {
                path: path.to_path_buf(),
                source,
            },
            TransferError::InvalidPath(msg) => Self::InvalidPath(msg),
        }
    }
}
