/// In-memory document client
///
/// Keeps databases, documents and design documents in process memory with
/// CouchDB-style revisions: every write bumps the generation, a write to an existing
/// document must carry its current revision, and a write carrying a revision for a
/// document that does not exist is a conflict. The two library views are answered
/// with the native row emitters from `library::index`.
///
/// Not durable. Used by the test-suite and for running the server without a database.

use crate::client::{ClientResult, DesignDocument, Document, DocumentClient, Revision, ViewRow};
use crate::errors::ClientError;
use crate::library::index::{flow_rows, library_rows, FLOW_VIEW, LIBRARY_VIEW};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone)]
struct StoredDocument {
    generation: u64,
    rev: Revision,
    body: Map<String, Value>,
}

#[derive(Debug, Default)]
struct MemoryDatabase {
    /// Ordered by id, matching view row order for equal keys
    docs: BTreeMap<String, StoredDocument>,
    designs: BTreeMap<String, DesignDocument>,
}

/// Number of calls served, per operation
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub get_document: usize,
    pub put_document: usize,
    pub post_view: usize,
}

/// Document client backed by process memory
#[derive(Debug, Default)]
pub struct MemoryDocumentClient {
    databases: Mutex<HashMap<String, MemoryDatabase>>,
    sequence: AtomicU64,
    unavailable: AtomicBool,
    calls: Mutex<CallCounts>,
}

impl MemoryDocumentClient {
    /// Empty client without any database
    pub fn new() -> Self {
        Self::default()
    }

    /// Client with an empty database `db` already present
    pub fn with_database(db: &str) -> Self {
        let client = Self::new();
        client.databases().insert(db.to_string(), MemoryDatabase::default());
        client
    }

    /// Make every call fail with a transport error while `true`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Calls served so far
    pub fn calls(&self) -> CallCounts {
        *self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether database `db` exists
    pub fn has_database(&self, db: &str) -> bool {
        self.databases().contains_key(db)
    }

    /// Whether design document `ddoc` is installed in `db`
    pub fn has_design_document(&self, db: &str, ddoc: &str) -> bool {
        self.databases()
            .get(db)
            .map(|d| d.designs.contains_key(ddoc))
            .unwrap_or(false)
    }

    /// Ids of all documents in `db`, in id order
    pub fn document_ids(&self, db: &str) -> Vec<String> {
        self.databases()
            .get(db)
            .map(|d| d.docs.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn databases(&self) -> MutexGuard<'_, HashMap<String, MemoryDatabase>> {
        self.databases.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, f: impl FnOnce(&mut CallCounts)) {
        let mut calls = self.calls.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut *calls);
    }

    fn check_available(&self) -> ClientResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(ClientError::Transport("service unavailable".into()))
        } else {
            Ok(())
        }
    }

    fn next_revision(&self, generation: u64) -> Revision {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        Revision::new(format!("{}-{:08x}", generation, seq))
    }
}

fn missing_database(db: &str) -> ClientError {
    ClientError::NotFound(format!("database {} does not exist", db))
}

#[async_trait]
impl DocumentClient for MemoryDocumentClient {
    async fn get_document(&self, db: &str, id: &str) -> ClientResult<Document> {
        self.record(|c| c.get_document += 1);
        self.check_available()?;

        let databases = self.databases();
        let database = databases.get(db).ok_or_else(|| missing_database(db))?;
        let stored = database
            .docs
            .get(id)
            .ok_or_else(|| ClientError::NotFound(format!("document {} is missing", id)))?;

        Ok(Document {
            id: id.to_string(),
            rev: stored.rev.clone(),
            body: stored.body.clone(),
        })
    }

    async fn put_document(
        &self,
        db: &str,
        id: &str,
        body: Map<String, Value>,
        rev: Option<&Revision>,
    ) -> ClientResult<Revision> {
        self.record(|c| c.put_document += 1);
        self.check_available()?;

        let mut databases = self.databases();
        let database = databases.get_mut(db).ok_or_else(|| missing_database(db))?;

        let generation = match (database.docs.get(id), rev) {
            (Some(current), Some(rev)) if current.rev == *rev => current.generation + 1,
            (None, None) => 1,
            (Some(current), _) => {
                return Err(ClientError::Conflict(format!(
                    "{} is at revision {}, write carried {:?}",
                    id,
                    current.rev,
                    rev.map(Revision::as_str)
                )))
            }
            (None, Some(rev)) => {
                return Err(ClientError::Conflict(format!("{} does not exist at revision {}", id, rev)))
            }
        };

        let new_rev = self.next_revision(generation);
        database.docs.insert(
            id.to_string(),
            StoredDocument { generation, rev: new_rev.clone(), body },
        );
        Ok(new_rev)
    }

    async fn head_database(&self, db: &str) -> ClientResult<()> {
        self.check_available()?;
        if self.has_database(db) {
            Ok(())
        } else {
            Err(missing_database(db))
        }
    }

    async fn put_database(&self, db: &str) -> ClientResult<()> {
        self.check_available()?;
        self.databases().entry(db.to_string()).or_default();
        Ok(())
    }

    async fn put_design_document(&self, db: &str, ddoc: &str, design: &DesignDocument) -> ClientResult<()> {
        self.check_available()?;
        let mut databases = self.databases();
        let database = databases.get_mut(db).ok_or_else(|| missing_database(db))?;
        if database.designs.contains_key(ddoc) {
            return Err(ClientError::Conflict(format!("_design/{} already exists", ddoc)));
        }
        database.designs.insert(ddoc.to_string(), design.clone());
        Ok(())
    }

    async fn post_view(&self, db: &str, ddoc: &str, view: &str, keys: &[Value]) -> ClientResult<Vec<ViewRow>> {
        self.record(|c| c.post_view += 1);
        self.check_available()?;

        let databases = self.databases();
        let database = databases.get(db).ok_or_else(|| missing_database(db))?;
        let design = database
            .designs
            .get(ddoc)
            .ok_or_else(|| ClientError::NotFound(format!("_design/{} is missing", ddoc)))?;
        if !design.views.contains_key(view) {
            return Err(ClientError::NotFound(format!("view {} is missing from _design/{}", view, ddoc)));
        }

        let emit: fn(&str, &StoredDocument) -> Vec<(Value, Value)> = match view {
            FLOW_VIEW => |id, _| flow_rows(id),
            LIBRARY_VIEW => |id, doc| library_rows(id, doc.body.get("meta").unwrap_or(&Value::Null)),
            other => return Err(ClientError::Transport(format!("no view engine for {}", other))),
        };

        let emitted: Vec<(String, Value, Value)> = database
            .docs
            .iter()
            .flat_map(|(id, doc)| emit(id, doc).into_iter().map(move |(k, v)| (id.clone(), k, v)))
            .collect();

        let rows = keys
            .iter()
            .flat_map(|key| {
                emitted
                    .iter()
                    .filter(move |(_, k, _)| k == key)
                    .map(|(id, k, v)| ViewRow { id: Some(id.clone()), key: k.clone(), value: v.clone() })
            })
            .collect();
        Ok(rows)
    }
}
