//! Data types for upload reconciliation.

use dbfs_transfer::{UploadMode, validate_remote_path};
use serde::{Deserialize, Serialize};

use crate::error::UploadError;
use crate::store::RemoteStatus;

/// Desired state of one remote path.
///
/// Constructed and validated once at the boundary; the core never sees the
/// loosely-typed record it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredUpload {
    remote_path: String,
    local_source: Option<String>,
}

/// Record shape accepted by [`DesiredUpload::from_config`].
#[derive(Debug, Deserialize)]
struct DesiredUploadRecord {
    dbfs_path: String,
    #[serde(default)]
    source: Option<String>,
}

impl DesiredUpload {
    /// Validates `remote_path`; an empty `local_source` is treated as absent.
    pub fn new(
        remote_path: impl Into<String>,
        local_source: Option<String>,
    ) -> Result<Self, UploadError> {
        let remote_path = remote_path.into();
        validate_remote_path(&remote_path)
            .map_err(|e| UploadError::InvalidPath(e.to_string()))?;
        Ok(Self {
            remote_path,
            local_source: local_source.filter(|s| !s.is_empty()),
        })
    }

    /// A directory at `remote_path`.
    pub fn directory(remote_path: impl Into<String>) -> Result<Self, UploadError> {
        Self::new(remote_path, None)
    }

    /// A file at `remote_path` with content from `source`.
    pub fn file(
        remote_path: impl Into<String>,
        source: impl Into<String>,
    ) -> Result<Self, UploadError> {
        Self::new(remote_path, Some(source.into()))
    }

    /// Builds from a `{"dbfs_path": ..., "source": ...}` record.
    ///
    /// Extra keys (computed attributes such as `is_directory`) are ignored.
    pub fn from_config(value: &serde_json::Value) -> Result<Self, UploadError> {
        let record = DesiredUploadRecord::deserialize(value)
            .map_err(|e| UploadError::InvalidConfig(e.to_string()))?;
        Self::new(record.dbfs_path, record.source)
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn local_source(&self) -> Option<&str> {
        self.local_source.as_deref()
    }

    pub fn mode(&self) -> UploadMode {
        UploadMode::from_source(self.local_source())
    }
}

/// Observable state reported back after each operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedState {
    #[serde(rename = "dbfs_path")]
    pub path: String,
    pub is_directory: bool,
    #[serde(
        rename = "file_size",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub size_bytes: Option<u64>,
}

impl ObservedState {
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            is_directory: true,
            size_bytes: None,
        }
    }

    pub fn file(path: impl Into<String>, size_bytes: u64) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
            size_bytes: Some(size_bytes),
        }
    }

    /// Sizes are only reported for files.
    pub fn from_status(path: impl Into<String>, status: RemoteStatus) -> Self {
        if status.is_directory {
            Self::directory(path)
        } else {
            Self::file(path, status.size_bytes)
        }
    }
}

/// What to do with an open handle when an upload fails part-way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlePolicy {
    /// Leave the handle open; the service expires it.
    #[default]
    Abandon,
    /// Issue one `close` on the failure path. A failing close is logged and
    /// the original error is still returned.
    BestEffortClose,
}

/// Tunables for [`ChunkUploader`](crate::ChunkUploader).
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub on_failure: HandlePolicy,
}

impl UploadOptions {
    pub fn with_on_failure(mut self, policy: HandlePolicy) -> Self {
        self.on_failure = policy;
        self
    }
}
