use chrono::{DateTime, Utc};
use linked_hash_map::LinkedHashMap;
use serde::{Deserialize, Deserializer, Serialize};

/// A single tracked SKU.
///
/// `last_updated` is set when the item is created and on every quantity
/// change. Snapshots written by older tools may omit it or store `null`;
/// it then defaults to the moment the snapshot is parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockItem {
    pub id: String,
    pub name: String,
    pub quantity: i64,
    pub min_stock: i64,
    #[serde(default = "Utc::now", deserialize_with = "timestamp_or_now")]
    pub last_updated: DateTime<Utc>,
}

impl StockItem {
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }
}

/// Exported bundle of every item in a store plus metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub items: Vec<StockItem>,
    #[serde(default = "Utc::now", deserialize_with = "timestamp_or_now")]
    pub export_date: DateTime<Utc>,
    #[serde(default)]
    pub total_items: usize,
}

impl Snapshot {
    pub fn new(items: Vec<StockItem>) -> Self {
        let total_items = items.len();
        Self {
            items,
            export_date: Utc::now(),
            total_items,
        }
    }
}

fn timestamp_or_now<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<DateTime<Utc>>::deserialize(deserializer)?.unwrap_or_else(Utc::now))
}

/// Insertion-ordered map of SKU id to item.
pub type ItemMap = LinkedHashMap<String, StockItem>;
