//! Stockroom – inventory record store with pluggable persistence.
//!
//! [`InventoryStore`] keeps SKUs in memory and, when asked to, persists
//! snapshots through any [`StorageAdapter`]: memory, browser-style web
//! storage, a JSON file, or a remote HTTP API. The `stockroom-server`
//! binary serves the HTTP side of that API.

pub mod app;
pub mod config;
pub mod errors;
pub mod persistence;
pub mod routes;
pub mod services;
pub mod state;

pub use errors::{InventoryError, StorageError};
pub use persistence::{
    FileAdapter, MemoryAdapter, RemoteAdapter, SharedAdapter, StorageAdapter, WebStorageAdapter,
    WebStorageArea, WebStorageKind,
};
pub use services::{InventoryStore, StoreOptions, Subscription};
pub use state::{Snapshot, StockItem};
