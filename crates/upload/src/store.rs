//! Remote block store trait.
//!
//! `BlockStore` is implemented by the HTTP client crate (and by mocks in
//! tests) so the upload protocol stays decoupled from the transport.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use crate::error::UploadError;

/// Boxed future returned by every [`BlockStore`] call.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Opaque token for an open streaming write.
///
/// Not `Clone`: [`BlockStore::close`] consumes it, so a handle is closed at
/// most once.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct UploadHandle(i64);

impl UploadHandle {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Raw handle value as issued by the service.
    pub fn id(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UploadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Remote view of a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RemoteStatus {
    pub is_directory: bool,
    pub size_bytes: u64,
}

/// Errors reported by a [`BlockStore`].
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invalid or expired handle {0}")]
    InvalidHandle(i64),

    #[error("API error {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Path-addressed block storage with a handle-based streaming write protocol.
pub trait BlockStore: Send + Sync {
    /// Creates `path` and any missing parents.
    fn mkdirs<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()>;

    /// Opens a write handle for `path`.
    fn create<'a>(&'a self, path: &'a str, overwrite: bool) -> StoreFuture<'a, UploadHandle>;

    /// Appends one block (at most `MAX_BLOCK_SIZE` bytes) to an open handle.
    fn add_block<'a>(&'a self, handle: &'a UploadHandle, data: &'a [u8])
    -> StoreFuture<'a, ()>;

    /// Commits and releases a handle.
    fn close(&self, handle: UploadHandle) -> StoreFuture<'_, ()>;

    /// Returns whether `path` is a directory and its size.
    fn get_status<'a>(&'a self, path: &'a str) -> StoreFuture<'a, RemoteStatus>;

    /// Deletes `path`; non-empty directories need `recursive`.
    fn delete<'a>(&'a self, path: &'a str, recursive: bool) -> StoreFuture<'a, ()>;
}

/// Runs a store call, racing it against `cancel`.
///
/// Cancellation drops the in-flight future and yields
/// [`UploadError::Cancelled`]; store failures go through `on_err`.
pub(crate) async fn call<T, F>(
    cancel: &CancellationToken,
    fut: StoreFuture<'_, T>,
    on_err: F,
) -> Result<T, UploadError>
where
    F: FnOnce(StoreError) -> UploadError,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(UploadError::Cancelled),
        result = fut => result.map_err(on_err),
    }
}
