use std::path::{Component, Path, PathBuf};

use crate::TransferError;

/// Whether a desired upload targets a directory or a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    Directory,
    File,
}

impl UploadMode {
    /// No local source (or an empty one) means a directory.
    pub fn from_source(source: Option<&str>) -> Self {
        match source {
            Some(s) if !s.is_empty() => Self::File,
            _ => Self::Directory,
        }
    }
}

/// Lexically cleans a path: drops `.` segments and folds `..` into the
/// preceding segment. `..` never climbs above a root; leading `..` on a
/// relative path is kept. An empty result becomes `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            Component::Normal(segment) => out.push(segment),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Resolves a local source against the process working directory.
pub fn resolve_local_source(source: &str) -> Result<PathBuf, TransferError> {
    let cwd = std::env::current_dir()?;
    resolve_local_source_in(source, &cwd)
}

/// Resolves a local source to an absolute, cleaned path.
///
/// Relative sources are joined onto `cwd`. The result must exist and be a
/// regular file.
pub fn resolve_local_source_in(source: &str, cwd: &Path) -> Result<PathBuf, TransferError> {
    if source.is_empty() {
        return Err(TransferError::InvalidPath("empty source path".into()));
    }

    let cleaned = normalize(Path::new(source));
    let resolved = if cleaned.has_root() || cleaned.is_absolute() {
        cleaned
    } else {
        normalize(&cwd.join(cleaned))
    };

    let meta = std::fs::metadata(&resolved).map_err(|e| {
        TransferError::InvalidPath(format!("cannot stat {}: {e}", resolved.display()))
    })?;
    if meta.is_dir() {
        return Err(TransferError::InvalidPath(format!(
            "source is a directory: {}",
            resolved.display()
        )));
    }

    Ok(resolved)
}

/// Validates a remote DBFS path: non-empty and slash-rooted.
pub fn validate_remote_path(path: &str) -> Result<(), TransferError> {
    if path.is_empty() {
        return Err(TransferError::InvalidPath("empty remote path".into()));
    }
    if !path.starts_with('/') {
        return Err(TransferError::InvalidPath(format!(
            "remote path must be absolute: {path}"
        )));
    }
    if path.contains('\0') {
        return Err(TransferError::InvalidPath(format!(
            "remote path contains NUL: {path:?}"
        )));
    }
    Ok(())
}

/// Parent of a slash-separated remote path (`/a/b/c` -> `/a/b`, `/x` -> `/`).
pub fn remote_parent(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) | None => "/",
        Some(idx) => &trimmed[..idx],
    }
}
