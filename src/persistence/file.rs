use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;
use tokio::sync::Mutex;

use super::StorageAdapter;
use crate::errors::StorageError;
use crate::state::Snapshot;

pub const DEFAULT_FILE_PATH: &str = "./inventory-data.json";

/// Stores every key in a single JSON file: `{ "<key>": <snapshot>, ... }`.
///
/// Saves are read-modify-write over the whole file. A missing or unparsable
/// file is treated as empty.
pub struct FileAdapter {
    path: PathBuf,
    // Serializes read-modify-write cycles issued through this adapter.
    write_lock: Mutex<()>,
}

impl FileAdapter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the key map, or `None` if the file is missing or not a JSON object.
    async fn read_entries(&self) -> Result<Option<Map<String, Value>>, StorageError> {
        let data = match fs::read_to_string(&self.path).await {
            Ok(d) => d,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No inventory file at {}", self.path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<Value>(&data) {
            Ok(Value::Object(map)) => Ok(Some(map)),
            Ok(_) => {
                tracing::warn!("{} is not a JSON object, ignoring", self.path.display());
                Ok(None)
            }
            Err(e) => {
                tracing::warn!("Failed to parse {}: {e}", self.path.display());
                Ok(None)
            }
        }
    }

    async fn write_entries(&self, entries: Map<String, Value>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(&Value::Object(entries))?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}

impl Default for FileAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_PATH)
    }
}

#[async_trait]
impl StorageAdapter for FileAdapter {
    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut entries = match self.read_entries().await {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                tracing::warn!("Could not read {}, starting empty: {e}", self.path.display());
                Map::new()
            }
        };
        entries.insert(key.to_string(), serde_json::to_value(snapshot)?);
        self.write_entries(entries).await?;

        tracing::debug!("Saved {key} to {}", self.path.display());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Snapshot>, StorageError> {
        let Some(mut entries) = self.read_entries().await? else {
            return Ok(None);
        };
        let Some(raw) = entries.remove(key) else {
            return Ok(None);
        };

        match serde_json::from_value::<Snapshot>(raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(e) => {
                tracing::warn!("Ignoring malformed snapshot {key} in {}: {e}", self.path.display());
                Ok(None)
            }
        }
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let Some(mut entries) = self.read_entries().await? else {
            return Ok(());
        };
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.write_entries(entries).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;
        fs::write(&self.path, "{}").await?;
        Ok(())
    }
}
