//! DBFS REST API client.
//!
//! Provides an async client for the DBFS API 2.0 and implements
//! [`dbfs_upload::BlockStore`] on top of it.

pub mod client;

pub use client::{Client, Error};
