use std::borrow::Cow;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Creates a directory and any missing parents (`mkdir -p`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MkdirsRequest {
    pub path: String,
}

/// Opens a streaming write handle for `path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRequest {
    pub path: String,
    #[serde(default)]
    pub overwrite: bool,
}

/// Appends one block to an open handle.
///
/// The `data` field is base64-encoded in JSON. Outgoing requests borrow the
/// block; decoded requests own their bytes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddBlockRequest<'a> {
    pub handle: i64,
    #[serde(with = "base64_bytes")]
    pub data: Cow<'a, [u8]>,
}

/// Closes an open handle, committing the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CloseRequest {
    pub handle: i64,
}

/// Deletes a file or directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteRequest {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Handle returned by `create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateResponse {
    pub handle: i64,
}

/// File information returned by `get-status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    pub path: String,
    #[serde(default)]
    pub is_dir: bool,
    #[serde(default)]
    pub file_size: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modification_time: Option<i64>,
}

/// Error body returned with any non-2xx status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub error_code: String,
    #[serde(default)]
    pub message: String,
}

/// Coarse classification of DBFS error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidHandle,
    Other,
}

impl ErrorKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "RESOURCE_DOES_NOT_EXIST" => Self::NotFound,
            "RESOURCE_ALREADY_EXISTS" | "DIRECTORY_NOT_EMPTY" => Self::Conflict,
            "INVALID_STATE" | "INVALID_HANDLE" => Self::InvalidHandle,
            _ => Self::Other,
        }
    }
}

mod base64_bytes {
    use std::borrow::Cow;

    use base64::{Engine, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        STANDARD.encode(data).serialize(serializer)
    }

    pub fn deserialize<'de, 'a, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Cow<'a, [u8]>, D::Error> {
        let s = String::deserialize(deserializer)?;
        STANDARD
            .decode(&s)
            .map(Cow::Owned)
            .map_err(serde::de::Error::custom)
    }
}
