use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::runtime::Handle;

use crate::errors::{InventoryError, Result, StorageError};
use crate::persistence::{SharedAdapter, StorageAdapter};
use crate::services::subscription::{self, Subscription};
use crate::state::{ItemMap, Snapshot, StockItem};

pub const DEFAULT_STORAGE_KEY: &str = "inventory-tracker-data";
pub const DEFAULT_QUANTITY: i64 = 0;
pub const DEFAULT_MIN_STOCK: i64 = 5;

pub type SnapshotHook = Arc<dyn Fn(&Snapshot) + Send + Sync>;
pub type ErrorHook = Arc<dyn Fn(&StorageError) + Send + Sync>;

/// Construction options for [`InventoryStore`].
#[derive(Clone)]
pub struct StoreOptions {
    /// Persist through the adapter after every mutation.
    pub autosave: bool,
    /// Key under which the store's snapshot is persisted.
    pub storage_key: String,
    pub adapter: Option<SharedAdapter>,
    /// Called after every successful save, implicit or explicit.
    pub on_save: Option<SnapshotHook>,
    /// Called after every successful load.
    pub on_load: Option<SnapshotHook>,
    /// Called when an autosave or the initial load of [`InventoryStore::open`] fails.
    pub on_error: Option<ErrorHook>,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            autosave: false,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            adapter: None,
            on_save: None,
            on_load: None,
            on_error: None,
        }
    }
}

impl StoreOptions {
    pub fn autosave(mut self, enabled: bool) -> Self {
        self.autosave = enabled;
        self
    }

    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn adapter(mut self, adapter: impl StorageAdapter + 'static) -> Self {
        self.adapter = Some(Arc::new(adapter));
        self
    }

    pub fn shared_adapter(mut self, adapter: SharedAdapter) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn on_save(mut self, hook: impl Fn(&Snapshot) + Send + Sync + 'static) -> Self {
        self.on_save = Some(Arc::new(hook));
        self
    }

    pub fn on_load(mut self, hook: impl Fn(&Snapshot) + Send + Sync + 'static) -> Self {
        self.on_load = Some(Arc::new(hook));
        self
    }

    pub fn on_error(mut self, hook: impl Fn(&StorageError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(hook));
        self
    }
}

#[derive(Clone)]
struct Hooks {
    on_save: Option<SnapshotHook>,
    on_load: Option<SnapshotHook>,
    on_error: Option<ErrorHook>,
}

impl Hooks {
    fn saved(&self, snapshot: &Snapshot) {
        if let Some(hook) = &self.on_save {
            hook(snapshot);
        }
    }

    fn loaded(&self, snapshot: &Snapshot) {
        if let Some(hook) = &self.on_load {
            hook(snapshot);
        }
    }

    fn failed(&self, error: &StorageError) {
        if let Some(hook) = &self.on_error {
            hook(error);
        }
    }
}

/// Inventory of SKUs, optionally persisted through a [`StorageAdapter`].
///
/// All queries and mutations operate on the in-memory map and return
/// immediately. With autosave enabled each mutation additionally spawns a
/// save of the state it produced; the outcome of that save only reaches the
/// log and the `on_error` / `on_save` hooks. Use [`InventoryStore::save`] to
/// persist and observe the result.
///
/// Clones share the same items and adapter.
#[derive(Clone)]
pub struct InventoryStore {
    items: Arc<RwLock<ItemMap>>,
    adapter: Arc<RwLock<Option<SharedAdapter>>>,
    storage_key: String,
    autosave: bool,
    hooks: Hooks,
}

impl InventoryStore {
    /// Store with no adapter and autosave off.
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    pub fn with_options(options: StoreOptions) -> Self {
        Self {
            items: Arc::new(RwLock::new(ItemMap::new())),
            adapter: Arc::new(RwLock::new(options.adapter)),
            storage_key: options.storage_key,
            autosave: options.autosave,
            hooks: Hooks {
                on_save: options.on_save,
                on_load: options.on_load,
                on_error: options.on_error,
            },
        }
    }

    /// Build a store and, when autosave is on, pull in whatever the adapter
    /// holds. A failing initial load is logged and reported to `on_error`.
    pub async fn open(options: StoreOptions) -> Self {
        let store = Self::with_options(options);
        if store.autosave {
            if let Err(InventoryError::Storage(e)) = store.load().await {
                tracing::warn!("Failed to load inventory data: {e}");
                store.hooks.failed(&e);
            }
        }
        store
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn is_autosave(&self) -> bool {
        self.autosave
    }

    pub fn storage_adapter(&self) -> Option<SharedAdapter> {
        self.adapter.read().clone()
    }

    /// Bind a different adapter. Data persisted through the previous one is
    /// left where it is.
    pub fn set_storage_adapter(&self, adapter: SharedAdapter) {
        *self.adapter.write() = Some(adapter);
    }

    /// Insert an item, silently replacing any item with the same id.
    pub fn add_item(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
        quantity: i64,
        min_stock: i64,
    ) -> StockItem {
        let item = StockItem {
            id: id.into(),
            name: name.into(),
            quantity,
            min_stock,
            last_updated: Utc::now(),
        };
        upsert(&mut self.items.write(), item.clone());
        self.schedule_save();
        item
    }

    /// [`add_item`](Self::add_item) with quantity 0 and a minimum stock of 5.
    pub fn add_item_with_defaults(
        &self,
        id: impl Into<String>,
        name: impl Into<String>,
    ) -> StockItem {
        self.add_item(id, name, DEFAULT_QUANTITY, DEFAULT_MIN_STOCK)
    }

    pub fn update_quantity(&self, id: &str, quantity: i64) -> Result<StockItem> {
        let updated = {
            let mut items = self.items.write();
            let item = items
                .get_mut(id)
                .ok_or_else(|| InventoryError::NotFound(id.to_string()))?;
            item.quantity = quantity;
            // Never move backwards, even if the wall clock does.
            item.last_updated = item.last_updated.max(Utc::now());
            item.clone()
        };
        self.schedule_save();
        Ok(updated)
    }

    /// Returns whether an item was removed.
    pub fn remove_item(&self, id: &str) -> bool {
        let removed = self.items.write().remove(id).is_some();
        self.schedule_save();
        removed
    }

    pub fn delete_item(&self, id: &str) -> bool {
        self.remove_item(id)
    }

    pub fn get_item(&self, id: &str) -> Option<StockItem> {
        self.items.read().get(id).cloned()
    }

    /// Every item, in insertion order.
    pub fn get_all_items(&self) -> Vec<StockItem> {
        self.items.read().values().cloned().collect()
    }

    pub fn get_low_stock_items(&self) -> Vec<StockItem> {
        self.items
            .read()
            .values()
            .filter(|item| item.is_low_stock())
            .cloned()
            .collect()
    }

    /// Items whose name contains `query`, ignoring case.
    pub fn search_items(&self, query: &str) -> Vec<StockItem> {
        let needle = query.to_lowercase();
        self.items
            .read()
            .values()
            .filter(|item| item.name.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    /// Sum of quantity × unit price. Items without a price count as zero.
    pub fn get_total_value(&self, prices: &HashMap<String, f64>) -> f64 {
        self.items
            .read()
            .values()
            .map(|item| item.quantity as f64 * prices.get(&item.id).copied().unwrap_or(0.0))
            .sum()
    }

    pub fn item_count(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn export_data(&self) -> Snapshot {
        Snapshot::new(self.get_all_items())
    }

    /// Replace every item with the contents of `snapshot`.
    pub fn import_data(&self, snapshot: Snapshot) {
        self.replace_items(snapshot.items);
        self.schedule_save();
    }

    /// Drop every item. Nothing is persisted.
    pub fn clear(&self) {
        self.items.write().clear();
    }

    /// Persist the current state and wait for the adapter to finish.
    ///
    /// Without a bound adapter this does nothing.
    pub async fn save(&self) -> Result<()> {
        let Some(adapter) = self.storage_adapter() else {
            tracing::debug!("No storage adapter bound, nothing to save");
            return Ok(());
        };
        let snapshot = self.export_data();
        adapter.save(&self.storage_key, &snapshot).await?;
        self.hooks.saved(&snapshot);
        Ok(())
    }

    /// Replace the in-memory state with the adapter's copy.
    ///
    /// Returns `false`, leaving items untouched, when the adapter holds
    /// nothing usable under the store's key.
    pub async fn load(&self) -> Result<bool> {
        let Some(adapter) = self.storage_adapter() else {
            return Ok(false);
        };
        let Some(snapshot) = adapter.load(&self.storage_key).await? else {
            tracing::debug!("No inventory data stored under {}", self.storage_key);
            return Ok(false);
        };

        self.replace_items(snapshot.items.clone());
        tracing::info!("Loaded inventory: {} items", snapshot.items.len());
        self.hooks.loaded(&snapshot);
        Ok(true)
    }

    /// Remove the store's key from the bound adapter.
    pub async fn clear_storage(&self) -> Result<()> {
        if let Some(adapter) = self.storage_adapter() {
            adapter.remove(&self.storage_key).await?;
        }
        Ok(())
    }

    /// Receive snapshots written to this store's key by other execution
    /// contexts. Only adapters with a change feed (local web storage)
    /// deliver anything; for the rest the returned subscription is inert.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Snapshot) + Send + 'static,
    {
        match self.storage_adapter().and_then(|adapter| adapter.changes()) {
            Some(feed) => subscription::watch(feed, self.storage_key.clone(), callback),
            None => Subscription::noop(),
        }
    }

    fn replace_items(&self, items: Vec<StockItem>) {
        let mut map = self.items.write();
        map.clear();
        for item in items {
            upsert(&mut map, item);
        }
    }

    /// Fire-and-forget save of the current state.
    fn schedule_save(&self) {
        if !self.autosave {
            return;
        }
        let Some(adapter) = self.storage_adapter() else {
            return;
        };
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!("No async runtime available, skipping autosave");
            return;
        };

        let snapshot = self.export_data();
        let key = self.storage_key.clone();
        let hooks = self.hooks.clone();

        runtime.spawn(async move {
            match adapter.save(&key, &snapshot).await {
                Ok(()) => {
                    tracing::debug!("Autosaved {} items under {key}", snapshot.total_items);
                    hooks.saved(&snapshot);
                }
                Err(e) => {
                    tracing::warn!("Failed to save inventory data: {e}");
                    hooks.failed(&e);
                }
            }
        });
    }
}

impl Default for InventoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InventoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InventoryStore")
            .field("storage_key", &self.storage_key)
            .field("autosave", &self.autosave)
            .field("items", &self.item_count())
            .finish()
    }
}

/// Insert or overwrite, keeping an existing id at its original position.
fn upsert(items: &mut ItemMap, item: StockItem) {
    if let Some(slot) = items.get_mut(&item.id) {
        *slot = item;
    } else {
        items.insert(item.id.clone(), item);
    }
}
