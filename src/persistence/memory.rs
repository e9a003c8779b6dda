//! Process-local adapter, useful for tests and throwaway stores.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::StorageAdapter;
use crate::errors::StorageError;
use crate::state::Snapshot;

/// In-memory implementation of [`StorageAdapter`].
///
/// Snapshots are cloned on the way in and on the way out, so callers never
/// share data with what is stored.
#[derive(Default)]
pub struct MemoryAdapter {
    data: Mutex<HashMap<String, Snapshot>>,
}

impl MemoryAdapter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.data.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.lock().is_empty()
    }
}

#[async_trait]
impl StorageAdapter for MemoryAdapter {
    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), StorageError> {
        self.data.lock().insert(key.to_string(), snapshot.clone());
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Snapshot>, StorageError> {
        Ok(self.data.lock().get(key).cloned())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.data.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.data.lock().clear();
        Ok(())
    }
}
