pub mod item;

pub use item::{ItemMap, Snapshot, StockItem};
