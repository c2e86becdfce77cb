//! DBFS REST API client.
//!
//! Async HTTP client using `reqwest` with Bearer token authentication.

use std::borrow::Cow;

use dbfs_protocol::{
    API_PREFIX, AddBlockRequest, CloseRequest, CreateRequest, CreateResponse, DeleteRequest,
    ErrorKind, ErrorResponse, FileInfo, MkdirsRequest, endpoints,
};
use dbfs_transfer::MAX_BLOCK_SIZE;
use dbfs_upload::{BlockStore, RemoteStatus, StoreError, StoreFuture, UploadHandle};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::trace;

/// Errors from the DBFS client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error {status} {code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid API token")]
    InvalidToken,

    #[error("block of {0} bytes exceeds the {max} byte limit", max = MAX_BLOCK_SIZE)]
    BlockTooLarge(usize),
}

impl Error {
    /// Converts into the store-level error, attributing handle errors to
    /// `handle` when one is involved.
    fn into_store_error(self, handle: Option<i64>) -> StoreError {
        match self {
            Error::Api {
                status,
                code,
                message,
            } => match (ErrorKind::from_code(&code), handle) {
                (ErrorKind::NotFound, _) => StoreError::NotFound(message),
                (ErrorKind::Conflict, _) => StoreError::Conflict(message),
                (ErrorKind::InvalidHandle, Some(h)) => StoreError::InvalidHandle(h),
                _ if status == 404 && code.is_empty() => StoreError::NotFound(message),
                _ => StoreError::Api {
                    status,
                    code,
                    message,
                },
            },
            Error::BlockTooLarge(len) => StoreError::Api {
                status: 0,
                code: "MAX_BLOCK_SIZE_EXCEEDED".into(),
                message: format!("block of {len} bytes exceeds {MAX_BLOCK_SIZE}"),
            },
            Error::Http(e) => StoreError::Transport(e.to_string()),
            Error::Json(e) => StoreError::Transport(format!("invalid response: {e}")),
            Error::InvalidToken => StoreError::Transport("invalid API token".into()),
        }
    }
}

/// DBFS API client.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    /// Creates a new client for a workspace `host` (e.g.
    /// `https://example.cloud.databricks.com`) with a personal access token.
    pub fn new(host: &str, token: &str) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| Error::InvalidToken)?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: host.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}/{}", self.base_url, API_PREFIX, endpoint)
    }

    /// Checks the status and returns the body bytes.
    async fn finish(&self, resp: reqwest::Response) -> Result<Vec<u8>, Error> {
        let status = resp.status();
        let body = resp.bytes().await?.to_vec();

        if !status.is_success() {
            let parsed = serde_json::from_slice::<ErrorResponse>(&body).unwrap_or_else(|_| {
                ErrorResponse {
                    error_code: String::new(),
                    message: String::from_utf8_lossy(&body).into_owned(),
                }
            });
            return Err(Error::Api {
                status: status.as_u16(),
                code: parsed.error_code,
                message: parsed.message,
            });
        }

        Ok(body)
    }

    /// Performs an authenticated POST with a JSON body.
    async fn post<T: Serialize>(&self, endpoint: &str, body: &T) -> Result<Vec<u8>, Error> {
        trace!(endpoint, "POST");
        let resp = self.http.post(self.url(endpoint)).json(body).send().await?;
        self.finish(resp).await
    }

    /// Performs an authenticated GET with query parameters.
    async fn get<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<R, Error> {
        trace!(endpoint, "GET");
        let resp = self.http.get(self.url(endpoint)).query(params).send().await?;
        let body = self.finish(resp).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// Creates `path` and any missing parents.
    pub async fn mkdirs(&self, path: &str) -> Result<(), Error> {
        let req = MkdirsRequest {
            path: path.to_string(),
        };
        self.post(endpoints::MKDIRS, &req).await?;
        Ok(())
    }

    /// Opens a write handle.
    pub async fn create(&self, path: &str, overwrite: bool) -> Result<i64, Error> {
        let req = CreateRequest {
            path: path.to_string(),
            overwrite,
        };
        let body = self.post(endpoints::CREATE, &req).await?;
        let resp: CreateResponse = serde_json::from_slice(&body)?;
        Ok(resp.handle)
    }

    /// Appends a block to an open handle. Oversized blocks are rejected
    /// without contacting the service.
    pub async fn add_block(&self, handle: i64, data: &[u8]) -> Result<(), Error> {
        if data.len() > MAX_BLOCK_SIZE {
            return Err(Error::BlockTooLarge(data.len()));
        }
        let req = AddBlockRequest {
            handle,
            data: Cow::Borrowed(data),
        };
        self.post(endpoints::ADD_BLOCK, &req).await?;
        Ok(())
    }

    /// Closes an open handle.
    pub async fn close(&self, handle: i64) -> Result<(), Error> {
        self.post(endpoints::CLOSE, &CloseRequest { handle }).await?;
        Ok(())
    }

    /// Returns file information for `path`.
    pub async fn get_status(&self, path: &str) -> Result<FileInfo, Error> {
        self.get(endpoints::GET_STATUS, &[("path", path)]).await
    }

    /// Deletes `path`.
    pub async fn delete(&self, path: &str, recursive: bool) -> Result<(), Error> {
        let req = DeleteRequest {
            path: path.to_string(),
            recursive,
        };
        self.post(endpoints::DELETE, &req).await?;
        Ok(())
    }

    /// Sets a custom base URL (for testing).
    #[cfg(test)]
    pub(crate) fn with_base_url(mut self, url: String) -> Self {
        self.base_url = url;
        self
    }
}

impl BlockStore for Client {
    fn mkdirs<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            Client::mkdirs(self, path)
                .await
                .map_err(|e| e.into_store_error(None))
        })
    }

    fn create<'a>(&'a self, path: &'a str, overwrite: bool) -> StoreFuture<'a, UploadHandle> {
        Box::pin(async move {
            Client::create(self, path, overwrite)
                .await
                .map(UploadHandle::new)
                .map_err(|e| e.into_store_error(None))
        })
    }

    fn add_block<'a>(
        &'a self,
        handle: &'a UploadHandle,
        data: &'a [u8],
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            Client::add_block(self, handle.id(), data)
                .await
                .map_err(|e| e.into_store_error(Some(handle.id())))
        })
    }

    fn close(&self, handle: UploadHandle) -> StoreFuture<'_, ()> {
        Box::pin(async move {
            Client::close(self, handle.id())
                .await
                .map_err(|e| e.into_store_error(Some(handle.id())))
        })
    }

    fn get_status<'a>(&'a self, path: &'a str) -> StoreFuture<'a, RemoteStatus> {
        Box::pin(async move {
            let info = Client::get_status(self, path)
                .await
                .map_err(|e| e.into_store_error(None))?;
            Ok(RemoteStatus {
                is_directory: info.is_dir,
                size_bytes: info.file_size.max(0) as u64,
            })
        })
    }

    fn delete<'a>(&'a self, path: &'a str, recursive: bool) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            Client::delete(self, path, recursive)
                .await
                .map_err(|e| e.into_store_error(None))
        })
    }
}
