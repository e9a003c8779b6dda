pub mod inventory_service;
pub mod subscription;

pub use inventory_service::{InventoryStore, StoreOptions};
pub use subscription::Subscription;
