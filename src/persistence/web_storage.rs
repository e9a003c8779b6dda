//! Browser-style `localStorage` / `sessionStorage` adapters.
//!
//! The string store itself is a [`WebStorageArea`] handed in by the caller.
//! An adapter built without one behaves as if the environment had no such
//! store: saves fail, loads find nothing.
//!
//! Several adapters sharing one area model several execution contexts
//! (tabs) on the same origin. Writes from one context show up as
//! [`StorageEvent`]s in the change feed of every *other* local adapter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use super::{parse_snapshot, StorageAdapter};
use crate::errors::StorageError;
use crate::state::Snapshot;

const EVENT_CAPACITY: usize = 64;

/// Context id used for writes made directly on an area.
const EXTERNAL_CONTEXT: u64 = 0;

/// Notification that an entry of an area changed.
///
/// `key` is `None` when the whole area was cleared. `new_value` is `None`
/// when the entry was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: Option<String>,
    pub new_value: Option<String>,
    source: u64,
}

/// Shared string store standing in for a browser storage area.
pub struct WebStorageArea {
    entries: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl WebStorageArea {
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            entries: RwLock::new(HashMap::new()),
            events,
        }
    }

    pub fn get_item(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    /// Write an entry from outside any adapter.
    pub fn set_item(&self, key: &str, value: &str) {
        self.write(EXTERNAL_CONTEXT, key, value.to_string());
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    fn write(&self, source: u64, key: &str, value: String) {
        self.entries.write().insert(key.to_string(), value.clone());
        self.notify(source, Some(key.to_string()), Some(value));
    }

    fn remove(&self, source: u64, key: &str) {
        if self.entries.write().remove(key).is_some() {
            self.notify(source, Some(key.to_string()), None);
        }
    }

    fn clear(&self, source: u64) {
        self.entries.write().clear();
        self.notify(source, None, None);
    }

    fn notify(&self, source: u64, key: Option<String>, new_value: Option<String>) {
        // No receivers is the common case.
        let _ = self.events.send(StorageEvent {
            key,
            new_value,
            source,
        });
    }
}

impl Default for WebStorageArea {
    fn default() -> Self {
        Self::new()
    }
}

/// Which browser store an adapter stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebStorageKind {
    Local,
    Session,
}

impl WebStorageKind {
    fn label(self) -> &'static str {
        match self {
            Self::Local => "localStorage",
            Self::Session => "sessionStorage",
        }
    }
}

fn next_context_id() -> u64 {
    static COUNTER: AtomicU64 = AtomicU64::new(1);
    COUNTER.fetch_add(1, Ordering::Relaxed)
}

/// [`StorageAdapter`] over a [`WebStorageArea`], storing snapshots as JSON text.
pub struct WebStorageAdapter {
    kind: WebStorageKind,
    area: Option<Arc<WebStorageArea>>,
    context: u64,
}

impl WebStorageAdapter {
    pub fn local(area: Arc<WebStorageArea>) -> Self {
        Self::with_area(WebStorageKind::Local, Some(area))
    }

    pub fn session(area: Arc<WebStorageArea>) -> Self {
        Self::with_area(WebStorageKind::Session, Some(area))
    }

    /// Adapter for an environment that lacks the store.
    pub fn unavailable(kind: WebStorageKind) -> Self {
        Self::with_area(kind, None)
    }

    fn with_area(kind: WebStorageKind, area: Option<Arc<WebStorageArea>>) -> Self {
        Self {
            kind,
            area,
            context: next_context_id(),
        }
    }

    pub fn kind(&self) -> WebStorageKind {
        self.kind
    }
}

#[async_trait]
impl StorageAdapter for WebStorageAdapter {
    async fn save(&self, key: &str, snapshot: &Snapshot) -> Result<(), StorageError> {
        let area = self
            .area
            .as_ref()
            .ok_or(StorageError::Unavailable(self.kind.label()))?;
        let raw = serde_json::to_string(snapshot)?;
        area.write(self.context, key, raw);
        Ok(())
    }

    async fn load(&self, key: &str) -> Result<Option<Snapshot>, StorageError> {
        let Some(area) = &self.area else {
            return Ok(None);
        };
        Ok(area
            .get_item(key)
            .and_then(|raw| parse_snapshot(&raw, self.kind.label())))
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        if let Some(area) = &self.area {
            area.remove(self.context, key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        if let Some(area) = &self.area {
            area.clear(self.context);
        }
        Ok(())
    }

    fn changes(&self) -> Option<ChangeFeed> {
        if self.kind != WebStorageKind::Local {
            return None;
        }
        self.area.as_ref().map(|area| ChangeFeed {
            receiver: area.events.subscribe(),
            context: self.context,
        })
    }
}

/// Stream of [`StorageEvent`]s caused by other contexts.
pub struct ChangeFeed {
    receiver: broadcast::Receiver<StorageEvent>,
    context: u64,
}

impl ChangeFeed {
    /// Wait for the next foreign write. Returns `None` once the area is gone.
    pub async fn next(&mut self) -> Option<StorageEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if event.source == self.context => continue,
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("Change feed lagged, {skipped} events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StockItem;
    use chrono::Utc;
    use std::time::Duration;
    use tokio::time::timeout;

    fn sample() -> Snapshot {
        Snapshot::new(vec![StockItem {
            id: "PROD001".into(),
            name: "Laptop".into(),
            quantity: 10,
            min_stock: 2,
            last_updated: Utc::now(),
        }])
    }

    #[tokio::test]
    async fn test_save_and_load_through_area() {
        let area = Arc::new(WebStorageArea::new());
        let adapter = WebStorageAdapter::local(area.clone());

        let snapshot = sample();
        adapter.save("inv", &snapshot).await.unwrap();
        assert!(area.get_item("inv").unwrap().contains("\"minStock\":2"));

        let loaded = adapter.load("inv").await.unwrap().unwrap();
        assert_eq!(loaded, snapshot);
    }

    #[tokio::test]
    async fn test_missing_area() {
        let adapter = WebStorageAdapter::unavailable(WebStorageKind::Session);

        let err = adapter.save("inv", &sample()).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable("sessionStorage")));
        assert!(adapter.load("inv").await.unwrap().is_none());
        adapter.remove("inv").await.unwrap();
        adapter.clear().await.unwrap();
        assert!(adapter.changes().is_none());
    }

    #[tokio::test]
    async fn test_malformed_entry_is_absent() {
        let area = Arc::new(WebStorageArea::new());
        area.set_item("inv", "{not json");
        let adapter = WebStorageAdapter::local(area);

        assert!(adapter.load("inv").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_change_feed_skips_own_writes() {
        let area = Arc::new(WebStorageArea::new());
        let tab_a = WebStorageAdapter::local(area.clone());
        let tab_b = WebStorageAdapter::local(area.clone());
        let mut feed = tab_a.changes().unwrap();

        tab_a.save("inv", &sample()).await.unwrap();
        tab_b.save("inv", &sample()).await.unwrap();

        let event = timeout(Duration::from_secs(1), feed.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(event.key.as_deref(), Some("inv"));
        assert!(event.new_value.is_some());
        assert_eq!(event.source, tab_b.context);
    }

    #[tokio::test]
    async fn test_session_has_no_change_feed() {
        let area = Arc::new(WebStorageArea::new());
        let adapter = WebStorageAdapter::session(area);
        assert!(adapter.changes().is_none());
    }

    #[tokio::test]
    async fn test_clear_empties_area() {
        let area = Arc::new(WebStorageArea::new());
        let adapter = WebStorageAdapter::session(area.clone());
        adapter.save("a", &sample()).await.unwrap();
        adapter.save("b", &sample()).await.unwrap();

        adapter.remove("a").await.unwrap();
        assert_eq!(area.len(), 1);
        adapter.clear().await.unwrap();
        assert!(area.is_empty());
    }
}
