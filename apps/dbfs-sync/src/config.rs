//! Sync configuration management.
//!
//! Reads `~/.config/dbfs-sync/config.json`, then applies the
//! `DATABRICKS_HOST` / `DATABRICKS_TOKEN` environment overrides.

use std::path::{Path, PathBuf};

use anyhow::bail;
use dbfs_upload::HandlePolicy;
use serde::{Deserialize, Serialize};

pub const HOST_ENV: &str = "DATABRICKS_HOST";
pub const TOKEN_ENV: &str = "DATABRICKS_TOKEN";

/// On-disk shape of `config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    host: String,
    #[serde(default)]
    token: String,
    #[serde(default)]
    on_failure: HandlePolicy,
}

/// Resolved configuration for one invocation.
#[derive(Debug, Clone, Default)]
pub struct SyncConfig {
    /// Workspace URL, e.g. `https://example.cloud.databricks.com`.
    pub host: String,

    /// Personal access token.
    pub token: String,

    /// Handle policy for uploads that fail part-way.
    pub on_failure: HandlePolicy,
}

impl SyncConfig {
    /// Loads from `path` (or the default location) and applies environment
    /// overrides.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path()?,
        };
        let mut config = Self::from_file(&path)?;
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Reads `path`. A missing file yields defaults; an unparsable one is
    /// logged and also yields defaults.
    fn from_file(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str::<ConfigFile>(&content) {
            Ok(file) => Ok(Self {
                host: file.host,
                token: file.token,
                on_failure: file.on_failure,
            }),
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Non-empty environment values replace file values.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(host) = lookup(HOST_ENV).filter(|v| !v.is_empty()) {
            self.host = host;
        }
        if let Some(token) = lookup(TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.token = token;
        }
    }

    /// Fails if the client cannot be built from this configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.host.is_empty() {
            bail!("no workspace host configured (set `host` or {HOST_ENV})");
        }
        if self.token.is_empty() {
            bail!("no API token configured (set `token` or {TOKEN_ENV})");
        }
        Ok(())
    }
}

fn default_config_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("dbfs-sync").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        if let Some(xdg) = std::env::var("XDG_CONFIG_HOME").ok().filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(xdg));
        }
        let Ok(home) = std::env::var("HOME") else {
            bail!("cannot locate config directory: HOME is not set");
        };
        Ok(PathBuf::from(home).join(".config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("config.json");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn parses_all_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{"host":"https://ws.example.com","token":"dapi123","on_failure":"best_effort_close"}"#,
        );

        let cfg = SyncConfig::from_file(&path).unwrap();
        assert_eq!(cfg.host, "https://ws.example.com");
        assert_eq!(cfg.token, "dapi123");
        assert_eq!(cfg.on_failure, HandlePolicy::BestEffortClose);
    }

    #[test]
    fn missing_keys_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{"host":"https://ws.example.com"}"#);

        let cfg = SyncConfig::from_file(&path).unwrap();
        assert_eq!(cfg.host, "https://ws.example.com");
        assert!(cfg.token.is_empty());
        assert_eq!(cfg.on_failure, HandlePolicy::Abandon);
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = SyncConfig::from_file(&dir.path().join("absent.json")).unwrap();
        assert!(cfg.host.is_empty());
        assert_eq!(cfg.on_failure, HandlePolicy::Abandon);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "{not json");

        let cfg = SyncConfig::from_file(&path).unwrap();
        assert!(cfg.host.is_empty());
        assert!(cfg.token.is_empty());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut cfg = SyncConfig {
            host: "https://file.example.com".into(),
            token: "file-token".into(),
            on_failure: HandlePolicy::Abandon,
        };
        cfg.apply_env(|key| match key {
            HOST_ENV => Some("https://env.example.com".into()),
            TOKEN_ENV => Some(String::new()),
            _ => None,
        });

        assert_eq!(cfg.host, "https://env.example.com");
        // Empty env values are ignored.
        assert_eq!(cfg.token, "file-token");
    }

    #[test]
    fn validate_requires_host_and_token() {
        let mut cfg = SyncConfig::default();
        assert!(cfg.validate().is_err());

        cfg.host = "https://ws.example.com".into();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains(TOKEN_ENV));

        cfg.token = "t".into();
        assert!(cfg.validate().is_ok());
    }
}
