//! # Placement registry: the per-category cache of resource entries.
//!
//! A pure key-value store keyed by placement id. It holds no policy; the
//! `LifecycleController` that owns it
//! serializes every read-modify-write.
//!
//! ## Rules
//! - At most one entry per placement id (the map key).
//! - Readers take a shared lock and get owned snapshots, so iteration never
//!   observes a half-applied write.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use super::entry::ResourceEntry;
use crate::policies::Category;

/// Map of placement id to entry for one category.
pub(crate) struct PlacementRegistry {
    category: Category,
    entries: RwLock<HashMap<Arc<str>, ResourceEntry>>,
}

impl PlacementRegistry {
    /// Creates an empty registry for `category`.
    pub(crate) fn new(category: Category) -> Self {
        Self {
            category,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a snapshot of the entry for `placement`.
    pub(crate) async fn get(&self, placement: &str) -> Option<ResourceEntry> {
        self.entries.read().await.get(placement).cloned()
    }

    /// Inserts or replaces the entry under its own placement id.
    pub(crate) async fn upsert(&self, entry: ResourceEntry) {
        debug_assert_eq!(entry.category(), self.category);
        let key = Arc::clone(entry.placement());
        self.entries.write().await.insert(key, entry);
    }

    /// Removes and returns the entry for `placement`.
    pub(crate) async fn remove(&self, placement: &str) -> Option<ResourceEntry> {
        self.entries.write().await.remove(placement)
    }

    /// Removes and returns every entry.
    pub(crate) async fn drain(&self) -> Vec<ResourceEntry> {
        self.entries.write().await.drain().map(|(_, e)| e).collect()
    }

    /// Snapshot of all entries, sorted by placement id.
    pub(crate) async fn entries(&self) -> Vec<ResourceEntry> {
        let entries = self.entries.read().await;
        let mut all: Vec<ResourceEntry> = entries.values().cloned().collect();
        all.sort_unstable_by(|a, b| a.placement().cmp(b.placement()));
        all
    }

    /// Number of entries.
    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if registry is empty.
    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
