//! Completed-output inventory.
//!
//! Counts completed units per [`OutputKey`]. Counts only grow: outputs gate
//! dependent steps but are not consumed by them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::OutputKey;

/// A single inventory entry (serialized form).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub output: OutputKey,
    pub count: u32,
}

/// Completed units per output key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<InventoryEntry>", into = "Vec<InventoryEntry>")]
pub struct Inventory {
    counts: BTreeMap<OutputKey, u32>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one completed unit.
    pub fn add(&mut self, key: OutputKey) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    /// Completed units for a key.
    pub fn count(&self, key: &OutputKey) -> u32 {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Whether at least one unit of `key` is available.
    #[inline]
    pub fn contains(&self, key: &OutputKey) -> bool {
        self.count(key) > 0
    }

    /// Whether every key in `keys` is available.
    pub fn satisfies(&self, keys: &[OutputKey]) -> bool {
        keys.iter().all(|k| self.contains(k))
    }

    /// Keys from `keys` that are not yet available.
    pub fn missing<'a>(&self, keys: &'a [OutputKey]) -> Vec<&'a OutputKey> {
        keys.iter().filter(|k| !self.contains(k)).collect()
    }

    /// Total completed units across all keys.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&OutputKey, u32)> {
        self.counts.iter().map(|(k, &c)| (k, c))
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

impl From<Vec<InventoryEntry>> for Inventory {
    fn from(entries: Vec<InventoryEntry>) -> Self {
        let mut inv = Inventory::new();
        for e in entries {
            *inv.counts.entry(e.output).or_insert(0) += e.count;
        }
        inv
    }
}

impl From<Inventory> for Vec<InventoryEntry> {
    fn from(inv: Inventory) -> Self {
        inv.counts
            .into_iter()
            .map(|(output, count)| InventoryEntry { output, count })
            .collect()
    }
}
