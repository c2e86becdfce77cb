//! Chunked upload of one local file through the create/add-block/close
//! handle protocol.

use std::path::Path;
use std::time::Instant;

use dbfs_transfer::ChunkReader;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::UploadError;
use crate::store::{BlockStore, UploadHandle, call};
use crate::types::{HandlePolicy, UploadOptions};

/// Streams a local file to a remote path.
///
/// Blocks are sent strictly in order; each `add_block` must be acknowledged
/// before the next block is read.
pub struct ChunkUploader<'a> {
    store: &'a dyn BlockStore,
    cancel: CancellationToken,
    options: UploadOptions,
}

impl<'a> ChunkUploader<'a> {
    pub fn new(store: &'a dyn BlockStore, cancel: CancellationToken) -> Self {
        Self {
            store,
            cancel,
            options: UploadOptions::default(),
        }
    }

    pub fn with_options(mut self, options: UploadOptions) -> Self {
        self.options = options;
        self
    }

    /// Uploads `local_path` to `remote_path`, replacing any existing file.
    ///
    /// Returns the number of bytes transferred. The pipeline:
    /// 1. `create(remote_path, overwrite = true)`
    /// 2. Open and stat the local file
    /// 3. `add_block` for each block of at most `MAX_BLOCK_SIZE` bytes
    /// 4. `close`
    pub async fn upload(&self, remote_path: &str, local_path: &Path) -> Result<u64, UploadError> {
        let started = Instant::now();

        let handle = call(&self.cancel, self.store.create(remote_path, true), |source| {
            UploadError::Open {
                path: remote_path.to_string(),
                source,
            }
        })
        .await?;
        debug!(path = %remote_path, handle = %handle, "opened upload handle");

        let total = match self.send_blocks(&handle, remote_path, local_path).await {
            Ok(total) => total,
            Err(e) => {
                self.release_failed(handle, remote_path, &e).await;
                return Err(e);
            }
        };

        call(&self.cancel, self.store.close(handle), |source| {
            UploadError::Close {
                path: remote_path.to_string(),
                source,
            }
        })
        .await?;

        info!(
            path = %remote_path,
            source = %local_path.display(),
            bytes = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upload complete"
        );
        Ok(total)
    }

    /// Reads and sends every block. Returns the file size.
    async fn send_blocks(
        &self,
        handle: &UploadHandle,
        remote_path: &str,
        local_path: &Path,
    ) -> Result<u64, UploadError> {
        let mut reader = ChunkReader::open(local_path)
            .await
            .map_err(|e| UploadError::from_transfer(local_path, e))?;
        let total = reader.plan().total_size();

        loop {
            let Some(block) = reader
                .next_block()
                .await
                .map_err(|e| UploadError::from_transfer(local_path, e))?
            else {
                break;
            };

            let offset = block.offset;
            call(
                &self.cancel,
                self.store.add_block(handle, &block.data),
                |source| UploadError::Transfer {
                    path: remote_path.to_string(),
                    offset,
                    source,
                },
            )
            .await?;
            debug!(path = %remote_path, offset, len = block.data.len(), "block sent");

            if reader.plan().is_complete() {
                break;
            }
        }

        // End-of-input before the planned size means the file shrank.
        if !reader.plan().is_complete() {
            return Err(UploadError::LocalIo {
                path: reader.path().to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    format!(
                        "file shrank during upload: expected {total} bytes, read {}",
                        reader.plan().position()
                    ),
                ),
            });
        }

        Ok(total)
    }

    /// Applies the configured [`HandlePolicy`] to a handle whose upload failed.
    async fn release_failed(&self, handle: UploadHandle, remote_path: &str, cause: &UploadError) {
        match self.options.on_failure {
            HandlePolicy::Abandon => {
                warn!(
                    path = %remote_path,
                    handle = %handle,
                    error = %cause,
                    "upload failed, leaving handle for the service to expire"
                );
            }
            HandlePolicy::BestEffortClose if self.cancel.is_cancelled() => {
                warn!(
                    path = %remote_path,
                    handle = %handle,
                    error = %cause,
                    "upload cancelled, skipping close of the open handle"
                );
            }
            HandlePolicy::BestEffortClose => {
                let id = handle.id();
                let closed = call(&self.cancel, self.store.close(handle), |source| {
                    UploadError::Close {
                        path: remote_path.to_string(),
                        source,
                    }
                })
                .await;
                match closed {
                    Ok(()) => debug!(path = %remote_path, handle = id, "closed handle after failed upload"),
                    Err(e) => warn!(
                        path = %remote_path,
                        handle = id,
                        error = %cause,
                        close_error = %e,
                        "upload failed and best-effort close also failed"
                    ),
                }
            }
        }
    }
}
