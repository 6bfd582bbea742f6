/// In-process cache of resolved library values
///
/// Keyed by library document id (which includes the type). Entries are only removed
/// by ancestor invalidation after a successful save; there is no eviction.

use crate::library::path;
use crate::library::types::LibraryValue;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct LibraryCache {
    entries: RwLock<HashMap<String, LibraryValue>>,
}

impl LibraryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<LibraryValue> {
        self.entries.read().await.get(key).cloned()
    }

    pub async fn insert(&self, key: String, value: LibraryValue) {
        self.entries.write().await.insert(key, value);
    }

    pub async fn contains(&self, key: &str) -> bool {
        self.entries.read().await.contains_key(key)
    }

    /// Number of cached entries and listings
    pub async fn entry_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop `path` and every ancestor directory of it for `lib_type`
    pub async fn invalidate_ancestors(&self, prefix: &str, lib_type: &str, lib_path: &str) {
        let mut entries = self.entries.write().await;
        for key in path::ancestor_ids(prefix, lib_type, lib_path) {
            if entries.remove(&key).is_some() {
                tracing::debug!("🧹 Invalidated library cache entry {}", key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::types::{LibraryEntry, ListingItem};
    use serde_json::json;

    fn listing() -> LibraryValue {
        LibraryValue::Listing(vec![ListingItem::Directory("a".into())])
    }

    #[tokio::test]
    async fn invalidation_walks_ancestors_only() {
        let cache = LibraryCache::new();
        for key in ["ns/lib/t", "ns/lib/t/a", "ns/lib/t/a/b", "ns/lib/t/x", "ns/lib/u/a"] {
            cache.insert(key.to_string(), listing()).await;
        }

        cache.invalidate_ancestors("ns", "t", "/a/b").await;

        assert!(!cache.contains("ns/lib/t").await);
        assert!(!cache.contains("ns/lib/t/a").await);
        assert!(!cache.contains("ns/lib/t/a/b").await);
        assert!(cache.contains("ns/lib/t/x").await);
        // other types keep their entries
        assert!(cache.contains("ns/lib/u/a").await);
    }

    #[tokio::test]
    async fn get_returns_stored_value() {
        let cache = LibraryCache::new();
        let entry = LibraryValue::Entry(LibraryEntry { meta: json!({}), body: json!("x") });
        cache.insert("k".into(), entry.clone()).await;
        assert_eq!(cache.get("k").await, Some(entry));
        assert_eq!(cache.entry_count().await, 1);
        assert_eq!(cache.get("missing").await, None);
    }
}
