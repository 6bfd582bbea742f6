/// Document Client Layer
///
/// The boundary to the remote document database. Everything above this module
/// talks to a `DocumentClient`; the concrete clients are:
/// - `CloudantClient`: CouchDB/Cloudant HTTP API over reqwest
/// - `MemoryDocumentClient`: in-process store with revisions and view emulation

// HTTP client for CouchDB/Cloudant
pub mod cloudant;

// In-memory client for tests and local runs
pub mod memory;

use crate::errors::ClientError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

pub use cloudant::CloudantClient;
pub use memory::MemoryDocumentClient;

/// Result alias for client calls
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Opaque revision token assigned by the store on every successful write
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    pub fn new(rev: impl Into<String>) -> Self {
        Self(rev.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored document: id, current revision and the remaining fields
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub rev: Revision,
    /// Document fields without `_id` and `_rev`
    pub body: Map<String, Value>,
}

impl Document {
    /// Split a raw CouchDB document into id, revision and body
    pub fn from_json(value: Value) -> ClientResult<Self> {
        let Value::Object(mut body) = value else {
            return Err(ClientError::Transport("document is not a JSON object".into()));
        };
        let id = match body.remove("_id") {
            Some(Value::String(id)) => id,
            _ => return Err(ClientError::Transport("document has no _id".into())),
        };
        let rev = match body.remove("_rev") {
            Some(Value::String(rev)) => Revision::new(rev),
            _ => return Err(ClientError::Transport(format!("document {} has no _rev", id))),
        };
        Ok(Self { id, rev, body })
    }

    /// Field value, `Null` when absent
    pub fn field(&self, name: &str) -> Value {
        self.body.get(name).cloned().unwrap_or(Value::Null)
    }
}

/// One row returned by a view query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRow {
    /// Id of the document that emitted the row
    #[serde(default)]
    pub id: Option<String>,
    pub key: Value,
    pub value: Value,
}

/// A single map view
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDefinition {
    /// JavaScript map function source
    pub map: String,
}

/// Design document holding named views
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DesignDocument {
    pub views: BTreeMap<String, ViewDefinition>,
}

/// Operations the storage layer needs from a document database
///
/// Documents are addressed by `(database, document id)`. Writes carry the revision
/// token of the version they replace; a missing or stale token yields
/// `ClientError::Conflict` when the document already exists.
#[async_trait]
pub trait DocumentClient: Send + Sync {
    /// Fetch a document, `ClientError::NotFound` when absent
    async fn get_document(&self, db: &str, id: &str) -> ClientResult<Document>;

    /// Create or replace a document, returning its new revision
    async fn put_document(
        &self,
        db: &str,
        id: &str,
        body: Map<String, Value>,
        rev: Option<&Revision>,
    ) -> ClientResult<Revision>;

    /// Check that a database exists, `ClientError::NotFound` when it does not
    async fn head_database(&self, db: &str) -> ClientResult<()>;

    /// Create a database
    async fn put_database(&self, db: &str) -> ClientResult<()>;

    /// Install a design document under `_design/<ddoc>`
    async fn put_design_document(&self, db: &str, ddoc: &str, design: &DesignDocument) -> ClientResult<()>;

    /// Query a view for the given keys
    async fn post_view(&self, db: &str, ddoc: &str, view: &str, keys: &[Value]) -> ClientResult<Vec<ViewRow>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn document_splits_reserved_fields() {
        let doc = Document::from_json(json!({"_id": "ns/flow", "_rev": "1-a", "flow": [1]})).unwrap();
        assert_eq!(doc.id, "ns/flow");
        assert_eq!(doc.rev.as_str(), "1-a");
        assert_eq!(doc.field("flow"), json!([1]));
        assert_eq!(doc.field("missing"), Value::Null);
        assert!(!doc.body.contains_key("_id"));
    }

    #[test]
    fn document_without_rev_is_rejected() {
        let err = Document::from_json(json!({"_id": "x"})).unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
