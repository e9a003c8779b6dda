//! Storage adapters.
//!
//! Every backend implements the same four operations keyed by a single
//! string, so `InventoryStore` never needs to know which one it talks to:
//!
//! ```text
//!              InventoryStore
//!                    │  Arc<dyn StorageAdapter>
//!   ┌────────────┬───┴──────────┬─────────────┐
//!   ▼            ▼              ▼             ▼
//! Memory   WebStorage(L/S)    File         Remote
//! ```

mod file;
mod memory;
mod remote;
mod web_storage;

use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::StorageError;
use crate::state::Snapshot;

pub use file::{FileAdapter, DEFAULT_FILE_PATH};
pub use memory::MemoryAdapter;
pub use remote::RemoteAdapter;
pub use web_storage::{ChangeFeed, StorageEvent, WebStorageAdapter, WebStorageArea, WebStorageKind};

/// Uniform persistence capability set.
#[async_trait]
pub trait StorageAdapter: Send + Sync {
    /// Persist `snapshot` under `key`, replacing whatever was there.
    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), StorageError>;

    /// Fetch the snapshot stored under `key`.
    ///
    /// Returns `Ok(None)` when nothing is stored or the stored data cannot be
    /// parsed.
    async fn load(&self, key: &str) -> Result<Option<Snapshot>, StorageError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Remove every key held by this backend.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Feed of writes made by other execution contexts.
    ///
    /// Only local web storage supports this; everything else returns `None`.
    fn changes(&self) -> Option<ChangeFeed> {
        None
    }
}

/// Adapter handle shared between a store and its autosave tasks.
pub type SharedAdapter = Arc<dyn StorageAdapter>;

/// Parse persisted snapshot text. Malformed data is logged and treated as absent.
pub(crate) fn parse_snapshot(raw: &str, origin: &str) -> Option<Snapshot> {
    match serde_json::from_str::<Snapshot>(raw) {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            tracing::warn!("Ignoring malformed snapshot from {origin}: {e}");
            None
        }
    }
}
