/// Library Path Index
///
/// Resolves `(type, path)` to a stored entry or, when no document lives at that
/// path, to a directory listing rebuilt from the library view. Results are cached
/// per document id; saves invalidate the saved path and all its ancestors once the
/// write has succeeded.

use crate::client::DocumentClient;
use crate::errors::{ClientError, Result, StorageError};
use crate::library::cache::LibraryCache;
use crate::library::index::{build_listing, listing_key, DESIGN_DOC, LIBRARY_VIEW};
use crate::library::path::{self, SEPARATOR};
use crate::library::types::{LibraryEntry, LibraryValue};
use serde_json::{Map, Value};
use std::sync::Arc;

const GET_OP: &str = "getLibraryEntry";
const SAVE_OP: &str = "saveLibraryEntry";

/// Library access for one namespace
pub struct LibraryIndex {
    client: Arc<dyn DocumentClient>,
    db: String,
    prefix: String,
    cache: LibraryCache,
}

impl LibraryIndex {
    pub fn new(client: Arc<dyn DocumentClient>, db: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            db: db.into(),
            prefix: prefix.into(),
            cache: LibraryCache::new(),
        }
    }

    pub fn cache(&self) -> &LibraryCache {
        &self.cache
    }

    /// Entry stored at `lib_path`, or the listing of the directory at `lib_path`
    pub async fn resolve(&self, lib_type: &str, lib_path: &str) -> Result<LibraryValue> {
        check_type(lib_type)?;
        let key = path::entry_id(&self.prefix, lib_type, lib_path);

        if let Some(value) = self.cache.get(&key).await {
            tracing::debug!("⚡ Library cache hit: {}", key);
            return Ok(value);
        }

        match self.client.get_document(&self.db, &key).await {
            Ok(doc) => {
                let value = LibraryValue::Entry(LibraryEntry {
                    meta: doc.field("meta"),
                    body: doc.field("body"),
                });
                self.cache.insert(key, value.clone()).await;
                return Ok(value);
            }
            Err(ClientError::NotFound(_)) => {}
            Err(e) => return Err(StorageError::op(GET_OP, e)),
        }

        let query = listing_key(&self.prefix, lib_type, lib_path);
        tracing::debug!("🔎 Listing library directory {}", query);
        let rows = self
            .client
            .post_view(&self.db, DESIGN_DOC, LIBRARY_VIEW, &[query])
            .await
            .map_err(|e| StorageError::op(GET_OP, e))?;

        let value = LibraryValue::Listing(build_listing(&rows));
        self.cache.insert(key, value.clone()).await;
        tracing::debug!("📦 Library cache holds {} entries", self.cache.entry_count().await);
        Ok(value)
    }

    /// Create or replace the entry at `lib_path`
    ///
    /// Reads the current revision first; a missing document is created without one.
    pub async fn save(&self, lib_type: &str, lib_path: &str, meta: Value, body: Value) -> Result<()> {
        check_type(lib_type)?;
        let key = path::entry_id(&self.prefix, lib_type, lib_path);

        let rev = match self.client.get_document(&self.db, &key).await {
            Ok(doc) => Some(doc.rev),
            Err(ClientError::NotFound(_)) => None,
            Err(e) => return Err(StorageError::op(SAVE_OP, e)),
        };

        let mut doc = Map::new();
        doc.insert("meta".to_string(), meta.clone());
        doc.insert("body".to_string(), body.clone());

        self.client
            .put_document(&self.db, &key, doc, rev.as_ref())
            .await
            .map_err(|e| StorageError::op(SAVE_OP, e))?;

        self.cache.invalidate_ancestors(&self.prefix, lib_type, lib_path).await;
        self.cache.insert(key.clone(), LibraryValue::Entry(LibraryEntry { meta, body })).await;
        tracing::debug!("📚 Saved library entry {}", key);
        Ok(())
    }
}

fn check_type(lib_type: &str) -> Result<()> {
    if lib_type.is_empty() || lib_type.contains(SEPARATOR) {
        return Err(StorageError::InvalidType(lib_type.to_string()));
    }
    Ok(())
}
