//! Wire types for the DBFS REST API 2.0.
//!
//! All endpoints live under `/api/2.0/dbfs/` and exchange snake_case JSON.

pub mod messages;

pub use messages::{
    AddBlockRequest, CloseRequest, CreateRequest, CreateResponse, DeleteRequest, ErrorKind,
    ErrorResponse, FileInfo, MkdirsRequest,
};

/// Path prefix shared by every DBFS endpoint.
pub const API_PREFIX: &str = "/api/2.0/dbfs";

/// Endpoint names relative to [`API_PREFIX`].
pub mod endpoints {
    pub const MKDIRS: &str = "mkdirs";
    pub const CREATE: &str = "create";
    pub const ADD_BLOCK: &str = "add-block";
    pub const CLOSE: &str = "close";
    pub const GET_STATUS: &str = "get-status";
    pub const DELETE: &str = "delete";
}
