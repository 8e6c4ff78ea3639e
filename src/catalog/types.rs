// Catalog domain types.
// Defines the item record stored in the cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A catalog item as stored under `item:<id>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: u64,
    pub name: String,
    pub description: String,
    /// When the item was written to the cache.
    pub fetched_at: DateTime<Utc>,
}

impl Item {
    /// Restamp `fetched_at` with the current time.
    pub fn stamped(mut self) -> Self {
        self.fetched_at = Utc::now();
        self
    }
}

/// Ordered item ids of a page.
pub type PageIds = Vec<u64>;
