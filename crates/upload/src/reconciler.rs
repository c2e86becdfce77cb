//! Reconciles a desired upload against the remote path.
//!
//! Exposes create/read/update/delete of a single remote path. Every
//! operation aborts on the first error; nothing is retried or rolled back.

use std::path::{Path, PathBuf};

use dbfs_transfer::{
    UploadMode, remote_parent, resolve_local_source, resolve_local_source_in,
    validate_remote_path,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::error::UploadError;
use crate::store::{BlockStore, call};
use crate::types::{DesiredUpload, ObservedState, UploadOptions};
use crate::uploader::ChunkUploader;

/// Drives the upload protocol for one remote path at a time.
pub struct UploadReconciler<'a> {
    store: &'a dyn BlockStore,
    cancel: CancellationToken,
    options: UploadOptions,
    working_dir: Option<PathBuf>,
}

impl<'a> UploadReconciler<'a> {
    pub fn new(store: &'a dyn BlockStore, cancel: CancellationToken) -> Self {
        Self {
            store,
            cancel,
            options: UploadOptions::default(),
            working_dir: None,
        }
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// Resolves relative sources against `dir` instead of the process
    /// working directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Returns a cancellation token for in-flight operations.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Creates the desired directory, or uploads the desired file.
    pub async fn create(&self, desired: &DesiredUpload) -> Result<ObservedState, UploadError> {
        let path = desired.remote_path();
        match (desired.mode(), desired.local_source()) {
            (UploadMode::File, Some(source)) => {
                let local = self.resolve_source(source)?;
                self.upload_file(path, &local).await
            }
            _ => {
                call(&self.cancel, self.store.mkdirs(path), |e| {
                    UploadError::from_store("mkdirs", path, e)
                })
                .await?;
                info!(path = %path, "created directory");
                Ok(ObservedState::directory(path))
            }
        }
    }

    /// Reads the remote state of `path`.
    pub async fn read(&self, path: &str) -> Result<ObservedState, UploadError> {
        check_remote(path)?;
        let status = call(&self.cancel, self.store.get_status(path), |e| {
            UploadError::from_store("get-status", path, e)
        })
        .await?;
        Ok(ObservedState::from_status(path, status))
    }

    /// Replaces the file at `path` with the desired content. `desired` must
    /// target the same remote path.
    ///
    /// Directories are left untouched. For files the remote object is
    /// deleted and fully re-uploaded. If the re-upload fails after the
    /// delete succeeded, the path is left absent and the error is returned
    /// as-is; the caller must treat the resource as gone.
    pub async fn update(
        &self,
        path: &str,
        desired: &DesiredUpload,
    ) -> Result<ObservedState, UploadError> {
        check_remote(path)?;
        if desired.remote_path() != path {
            return Err(UploadError::InvalidPath(format!(
                "desired state targets {}, not {path}",
                desired.remote_path()
            )));
        }
        let status = call(&self.cancel, self.store.get_status(path), |e| {
            UploadError::from_store("get-status", path, e)
        })
        .await?;
        if status.is_directory {
            debug!(path = %path, "remote is a directory, nothing to update");
            return Ok(ObservedState::directory(path));
        }

        // Resolve before deleting so a bad source leaves the remote intact.
        let Some(source) = desired.local_source() else {
            return Err(UploadError::InvalidPath(format!(
                "{path} is a file but no local source is configured"
            )));
        };
        let local = self.resolve_source(source)?;

        call(&self.cancel, self.store.delete(path, false), |e| {
            UploadError::from_store("delete", path, e)
        })
        .await?;
        debug!(path = %path, "deleted remote file for replacement");

        self.upload_file(path, &local).await.inspect_err(|e| {
            error!(
                path = %path,
                error = %e,
                "re-upload failed after delete, remote file is now absent"
            );
        })
    }

    /// Deletes `path` (non-recursive).
    pub async fn delete(&self, path: &str) -> Result<(), UploadError> {
        check_remote(path)?;
        call(&self.cancel, self.store.delete(path, false), |e| {
            UploadError::from_store("delete", path, e)
        })
        .await?;
        info!(path = %path, "deleted remote path");
        Ok(())
    }

    /// `mkdir -p` on the parent, then the chunked upload.
    async fn upload_file(&self, path: &str, local: &Path) -> Result<ObservedState, UploadError> {
        let parent = remote_parent(path);
        match call(&self.cancel, self.store.mkdirs(parent), |e| {
            UploadError::from_store("mkdirs", parent, e)
        })
        .await
        {
            Ok(()) => {}
            Err(UploadError::Cancelled) => return Err(UploadError::Cancelled),
            // Best effort; create reports the real failure.
            Err(e) => debug!(parent = %parent, error = %e, "ignoring parent mkdirs failure"),
        }

        let size = ChunkUploader::new(self.store, self.cancel.clone())
            .with_options(self.options.clone())
            .upload(path, local)
            .await?;
        Ok(ObservedState::file(path, size))
    }

    fn resolve_source(&self, source: &str) -> Result<PathBuf, UploadError> {
        let resolved = match &self.working_dir {
            Some(dir) => resolve_local_source_in(source, dir),
            None => resolve_local_source(source),
        };
        resolved.map_err(|e| UploadError::InvalidPath(e.to_string()))
    }
}

fn check_remote(path: &str) -> Result<(), UploadError> {
    validate_remote_path(path).map_err(|e| UploadError::InvalidPath(e.to_string()))
}
