use std::sync::Arc;
use std::time::Duration;
use std::{fs, path::Path};

use serde::Deserialize;
use tracing::level_filters::LevelFilter;

use crate::errors::{ConfigError, StorageError};
use crate::persistence::{FileAdapter, MemoryAdapter, RemoteAdapter, SharedAdapter, DEFAULT_FILE_PATH};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// HTTP port to listen on.
    pub port: u16,

    /// Log level for tracing (e.g. "info", "debug").
    pub log_level: String,

    pub server_version: String,

    /// Backend holding the snapshots served under `/inventory`.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = fs::read_to_string(path.as_ref())?;
        Ok(serde_json::from_str::<AppConfig>(&file)?)
    }

    /// Unknown level names fall back to `INFO`.
    pub fn level_filter(&self) -> LevelFilter {
        match self.log_level.to_lowercase().as_str() {
            "trace" => LevelFilter::TRACE,
            "debug" => LevelFilter::DEBUG,
            "info" => LevelFilter::INFO,
            "warn" => LevelFilter::WARN,
            "error" => LevelFilter::ERROR,
            _ => LevelFilter::INFO,
        }
    }
}

/// Explicit choice of storage adapter.
///
/// ```json
/// { "kind": "file", "path": "./inventory-data.json" }
/// { "kind": "remote", "base_url": "https://api.example.com", "timeout_ms": 5000 }
/// ```
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageConfig {
    #[default]
    Memory,
    File {
        #[serde(default = "default_file_path")]
        path: String,
    },
    Remote {
        base_url: String,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },
}

fn default_file_path() -> String {
    DEFAULT_FILE_PATH.to_string()
}

impl StorageConfig {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File { .. } => "file",
            Self::Remote { .. } => "remote",
        }
    }

    pub fn build(&self) -> Result<SharedAdapter, StorageError> {
        let adapter: SharedAdapter = match self {
            Self::Memory => Arc::new(MemoryAdapter::new()),
            Self::File { path } => Arc::new(FileAdapter::new(path)),
            Self::Remote {
                base_url,
                timeout_ms: Some(ms),
            } => Arc::new(RemoteAdapter::with_timeout(
                base_url.as_str(),
                Duration::from_millis(*ms),
            )?),
            Self::Remote {
                base_url,
                timeout_ms: None,
            } => Arc::new(RemoteAdapter::new(base_url.as_str())),
        };
        Ok(adapter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "port": 8080,
                "log_level": "debug",
                "server_version": "1.2.0",
                "storage": {{ "kind": "file", "path": "/tmp/inv.json" }}
            }}"#
        )
        .unwrap();

        let cfg = AppConfig::load_from_file(file.path()).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.level_filter(), LevelFilter::DEBUG);
        assert_eq!(
            cfg.storage,
            StorageConfig::File {
                path: "/tmp/inv.json".into()
            }
        );
    }

    #[test]
    fn test_storage_defaults() {
        let cfg: AppConfig = serde_json::from_str(
            r#"{ "port": 1, "log_level": "loud", "server_version": "0.1.0" }"#,
        )
        .unwrap();
        assert_eq!(cfg.storage, StorageConfig::Memory);
        assert_eq!(cfg.level_filter(), LevelFilter::INFO);

        let file: StorageConfig = serde_json::from_str(r#"{ "kind": "file" }"#).unwrap();
        assert_eq!(
            file,
            StorageConfig::File {
                path: DEFAULT_FILE_PATH.into()
            }
        );
    }

    #[test]
    fn test_build_adapters() {
        for cfg in [
            StorageConfig::Memory,
            StorageConfig::File {
                path: "inv.json".into(),
            },
            StorageConfig::Remote {
                base_url: "http://localhost:3000".into(),
                timeout_ms: Some(250),
            },
        ] {
            let adapter = cfg.build().unwrap();
            assert!(adapter.changes().is_none(), "{} has no change feed", cfg.kind());
        }
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load_from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }
}
