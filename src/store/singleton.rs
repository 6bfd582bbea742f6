/// Revisioned singleton documents
///
/// Flows, credentials, settings and sessions are each stored whole in one document
/// at `<prefix>/<name>`. The store remembers the last revision it saw for each of
/// them and sends it with the next write, so a write after an external update is
/// rejected with a conflict instead of overwriting. Nothing is retried here; the
/// caller re-reads to pick up the fresh revision.

use crate::client::{DocumentClient, Revision};
use crate::errors::{ClientError, Result, StorageError};
use arc_swap::ArcSwapOption;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

/// The four whole-document resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Flows,
    Credentials,
    Settings,
    Sessions,
}

impl Resource {
    pub const ALL: [Resource; 4] = [Resource::Flows, Resource::Credentials, Resource::Settings, Resource::Sessions];

    /// Last segment of the document id
    pub fn document_name(self) -> &'static str {
        match self {
            Resource::Flows => "flow",
            Resource::Credentials => "credential",
            Resource::Settings => "settings",
            Resource::Sessions => "sessions",
        }
    }

    /// Document field holding the payload
    pub fn field(self) -> &'static str {
        match self {
            Resource::Flows => "flow",
            Resource::Credentials => "credentials",
            Resource::Settings => "settings",
            Resource::Sessions => "sessions",
        }
    }

    /// Value returned when the document has never been written
    pub fn empty(self) -> Value {
        match self {
            Resource::Flows => json!([]),
            Resource::Credentials | Resource::Settings | Resource::Sessions => json!({}),
        }
    }

    /// Operation name used in read errors
    pub fn get_op(self) -> &'static str {
        match self {
            Resource::Flows => "getFlows",
            Resource::Credentials => "getCredentials",
            Resource::Settings => "getSettings",
            Resource::Sessions => "getSessions",
        }
    }

    /// Operation name used in write errors
    pub fn save_op(self) -> &'static str {
        match self {
            Resource::Flows => "saveFlows",
            Resource::Credentials => "saveCredentials",
            Resource::Settings => "saveSettings",
            Resource::Sessions => "saveSessions",
        }
    }

    /// Full document id under `prefix`
    pub fn document_id(self, prefix: &str) -> String {
        format!("{}/{}", prefix, self.document_name())
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.document_name())
    }
}

/// Last-seen revision per resource
///
/// Each slot is swapped atomically; a slot is only ever replaced by the revision
/// returned from a successful read or write.
#[derive(Debug, Default)]
pub struct RevisionTracker {
    flows: ArcSwapOption<Revision>,
    credentials: ArcSwapOption<Revision>,
    settings: ArcSwapOption<Revision>,
    sessions: ArcSwapOption<Revision>,
}

impl RevisionTracker {
    fn slot(&self, resource: Resource) -> &ArcSwapOption<Revision> {
        match resource {
            Resource::Flows => &self.flows,
            Resource::Credentials => &self.credentials,
            Resource::Settings => &self.settings,
            Resource::Sessions => &self.sessions,
        }
    }

    pub fn get(&self, resource: Resource) -> Option<Revision> {
        self.slot(resource).load_full().map(|rev| (*rev).clone())
    }

    fn set(&self, resource: Resource, rev: Revision) {
        self.slot(resource).store(Some(Arc::new(rev)));
    }
}

/// Store for the singleton documents of one namespace
pub struct SingletonStore {
    client: Arc<dyn DocumentClient>,
    db: String,
    prefix: String,
    revisions: RevisionTracker,
}

impl SingletonStore {
    pub fn new(client: Arc<dyn DocumentClient>, db: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            client,
            db: db.into(),
            prefix: prefix.into(),
            revisions: RevisionTracker::default(),
        }
    }

    /// Read a resource, remembering its revision
    ///
    /// Never-written resources yield their empty default and leave the revision unset.
    pub async fn get(&self, resource: Resource) -> Result<Value> {
        let id = resource.document_id(&self.prefix);
        match self.client.get_document(&self.db, &id).await {
            Ok(doc) => {
                tracing::debug!("📥 Read {} at revision {}", id, doc.rev);
                self.revisions.set(resource, doc.rev.clone());
                Ok(doc.body.get(resource.field()).cloned().unwrap_or_else(|| resource.empty()))
            }
            Err(ClientError::NotFound(_)) => {
                tracing::debug!("📭 {} not stored yet, returning empty default", id);
                Ok(resource.empty())
            }
            Err(e) => Err(StorageError::op(resource.get_op(), e)),
        }
    }

    /// Write a resource with the remembered revision attached
    ///
    /// Fails with a conflict when the document changed since it was last read or
    /// written through this store.
    pub async fn put(&self, resource: Resource, payload: Value) -> Result<()> {
        let id = resource.document_id(&self.prefix);
        let rev = self.revisions.get(resource);

        let mut body = Map::new();
        body.insert(resource.field().to_string(), payload);

        let new_rev = self
            .client
            .put_document(&self.db, &id, body, rev.as_ref())
            .await
            .map_err(|e| StorageError::op(resource.save_op(), e))?;

        tracing::debug!("💾 Saved {} at revision {}", id, new_rev);
        self.revisions.set(resource, new_rev);
        Ok(())
    }

    /// Revision the next write of `resource` will carry
    pub fn revision(&self, resource: Resource) -> Option<Revision> {
        self.revisions.get(resource)
    }
}
