//! Command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "dbfs-sync", version, about = "Reconcile local files and directories into DBFS")]
pub struct Cli {
    /// Config file (defaults to ~/.config/dbfs-sync/config.json).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a directory, or upload a file when --source is given.
    Create {
        #[arg(long, value_name = "DBFS_PATH")]
        path: String,
        #[arg(long, value_name = "LOCAL_PATH")]
        source: Option<String>,
    },
    /// Report the remote state of a path.
    Read {
        #[arg(long, value_name = "DBFS_PATH")]
        path: String,
    },
    /// Replace a remote file with new local content.
    Update {
        #[arg(long, value_name = "DBFS_PATH")]
        path: String,
        #[arg(long, value_name = "LOCAL_PATH")]
        source: Option<String>,
    },
    /// Delete a remote path (non-recursive).
    Delete {
        #[arg(long, value_name = "DBFS_PATH")]
        path: String,
    },
    /// Apply a desired-state record `{"dbfs_path": ..., "source": ...}`.
    Apply {
        #[arg(long, value_name = "FILE")]
        file: PathBuf,
    },
}
