//! DBFS upload protocol and desired-state reconciliation.
//!
//! This crate implements the **business logic** for putting a local file
//! (or a directory marker) at a remote DBFS path. It has no transport
//! dependencies: callers provide a [`BlockStore`] implementation (the HTTP
//! client crate, or a mock in tests).
//!
//! # Pipeline
//!
//! 1. **Resolve** — validate the remote path, resolve the local source
//! 2. **Prepare** — `mkdirs` the directory, or the parent of the file
//! 3. **Open** — `create` a write handle with overwrite enabled
//! 4. **Append** — `add-block` in blocks of at most 900,000 bytes
//! 5. **Close** — `close` the handle and report the observed state

pub mod error;
pub mod reconciler;
pub mod store;
pub mod types;
pub mod uploader;

#[cfg(test)]
mod mock;

// Re-export primary types for convenience.
pub use error::UploadError;
pub use reconciler::UploadReconciler;
pub use store::{BlockStore, RemoteStatus, StoreError, StoreFuture, UploadHandle};
pub use types::{DesiredUpload, HandlePolicy, ObservedState, UploadOptions};
pub use uploader::ChunkUploader;
