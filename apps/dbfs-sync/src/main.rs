//! dbfs-sync entry point.

mod cli;
mod commands;
mod config;

use anyhow::Context;
use clap::Parser;
use dbfs_client::Client;
use dbfs_upload::{UploadOptions, UploadReconciler};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::SyncConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the observed state.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,dbfs=debug")),
        )
        .init();

    let cli = Cli::parse();

    let cfg = SyncConfig::load(cli.config.as_deref())?;
    cfg.validate()?;
    tracing::debug!(host = %cfg.host, on_failure = ?cfg.on_failure, "configuration loaded");

    let client = Client::new(&cfg.host, &cfg.token).context("failed to build DBFS client")?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, cancelling in-flight request");
            ctrl_c.cancel();
        }
    });

    let reconciler = UploadReconciler::new(&client, cancel)
        .with_options(UploadOptions::default().with_on_failure(cfg.on_failure));

    if let Some(state) = commands::execute(&reconciler, cli.command).await? {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    Ok(())
}
