//! Subcommand execution against a [`BlockStore`].

use std::path::Path;

use anyhow::Context;
use dbfs_upload::{DesiredUpload, ObservedState, UploadError, UploadReconciler};

use crate::cli::Command;

/// Runs `command`. Returns the observed state, or `None` for `delete`.
pub async fn execute(
    reconciler: &UploadReconciler<'_>,
    command: Command,
) -> anyhow::Result<Option<ObservedState>> {
    let state = match command {
        Command::Create { path, source } => {
            let desired = DesiredUpload::new(path, source)?;
            reconciler.create(&desired).await?
        }
        Command::Read { path } => reconciler.read(&path).await?,
        Command::Update { path, source } => {
            let desired = DesiredUpload::new(path.clone(), source)?;
            reconciler.update(&path, &desired).await?
        }
        Command::Delete { path } => {
            reconciler.delete(&path).await?;
            return Ok(None);
        }
        Command::Apply { file } => {
            let desired = load_desired(&file)?;
            apply(reconciler, &desired).await?
        }
    };
    Ok(Some(state))
}

/// Creates the path if it does not exist remotely, otherwise updates it.
pub async fn apply(
    reconciler: &UploadReconciler<'_>,
    desired: &DesiredUpload,
) -> Result<ObservedState, UploadError> {
    let path = desired.remote_path();
    match reconciler.read(path).await {
        Ok(_) => reconciler.update(path, desired).await,
        Err(UploadError::NotFound(_)) => {
            tracing::debug!(path = %path, "not present remotely, creating");
            reconciler.create(desired).await
        }
        Err(e) => Err(e),
    }
}

fn load_desired(file: &Path) -> anyhow::Result<DesiredUpload> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    Ok(DesiredUpload::from_config(&value)?)
}
