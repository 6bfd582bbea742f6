/// Bootstrap sequencer
///
/// Runs once per initialization:
/// 1. Make sure the database exists, creating it and the `library` design document
///    when it does not. Failure here fails initialization.
/// 2. If no flow document exists yet, install `default/flows.json` and
///    `default/flow_creds.json` from the user directory, concurrently. A missing,
///    unreadable or malformed file, or a failed write, is logged and skipped.
///
/// Existing flows are never replaced by defaults.

use crate::client::DocumentClient;
use crate::errors::{ClientError, Result, StorageError};
use crate::library::index::{design_document, DESIGN_DOC};
use crate::store::{Resource, SingletonStore};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Default flows, relative to the user directory
pub const DEFAULT_FLOWS_FILE: &str = "default/flows.json";
/// Default credentials, relative to the user directory
pub const DEFAULT_CREDENTIALS_FILE: &str = "default/flow_creds.json";

/// What happened to one default-content file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// Parsed and written
    Installed,
    /// No such file, or no user directory configured
    Missing,
    /// Read, parse or write failed
    Failed(String),
    /// Flows already existed, defaults were not considered
    Skipped,
}

/// Summary of an initialization run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    /// Database (and design document) were created by this run
    pub created_database: bool,
    pub flows: SeedOutcome,
    pub credentials: SeedOutcome,
}

pub struct Bootstrap<'a> {
    client: &'a dyn DocumentClient,
    db: &'a str,
    prefix: &'a str,
    store: &'a SingletonStore,
    user_dir: Option<&'a Path>,
}

impl<'a> Bootstrap<'a> {
    pub fn new(
        client: &'a dyn DocumentClient,
        db: &'a str,
        prefix: &'a str,
        store: &'a SingletonStore,
        user_dir: Option<&'a Path>,
    ) -> Self {
        Self { client, db, prefix, store, user_dir }
    }

    pub async fn run(&self) -> Result<BootstrapReport> {
        let created_database = self.ensure_database().await?;
        let (flows, credentials) = self.prepopulate().await;
        Ok(BootstrapReport { created_database, flows, credentials })
    }

    /// Returns `true` when the database had to be created
    async fn ensure_database(&self) -> Result<bool> {
        match self.client.head_database(self.db).await {
            Ok(()) => {
                tracing::info!("🗄️ Flows database {} found", self.db);
                return Ok(false);
            }
            Err(ClientError::NotFound(_)) => {}
            Err(e) => return Err(StorageError::op("checkDatabase", e)),
        }

        self.client
            .put_database(self.db)
            .await
            .map_err(|e| StorageError::op("createDatabase", e))?;
        tracing::info!("✅ Created database {}", self.db);

        self.client
            .put_design_document(self.db, DESIGN_DOC, &design_document())
            .await
            .map_err(|e| StorageError::op("createViews", e))?;
        tracing::info!("✅ Created standard views in _design/{}", DESIGN_DOC);

        Ok(true)
    }

    async fn prepopulate(&self) -> (SeedOutcome, SeedOutcome) {
        let flow_id = Resource::Flows.document_id(self.prefix);
        match self.client.get_document(self.db, &flow_id).await {
            Ok(_) => {
                tracing::info!("📋 Flows already exist, leaving them alone");
                return (SeedOutcome::Skipped, SeedOutcome::Skipped);
            }
            Err(ClientError::NotFound(_)) => {}
            Err(e) => {
                tracing::warn!("⚠️ Could not check for existing flows, skipping defaults: {}", e);
                return (SeedOutcome::Skipped, SeedOutcome::Skipped);
            }
        }

        tokio::join!(
            self.seed(Resource::Flows, DEFAULT_FLOWS_FILE),
            self.seed(Resource::Credentials, DEFAULT_CREDENTIALS_FILE),
        )
    }

    async fn seed(&self, resource: Resource, relative: &str) -> SeedOutcome {
        let Some(user_dir) = self.user_dir else {
            tracing::info!("📭 No user directory configured, no default {}", resource);
            return SeedOutcome::Missing;
        };
        let file = user_dir.join(relative);

        match tokio::fs::try_exists(&file).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::info!("📭 No default {} found at {}", resource, file.display());
                return SeedOutcome::Missing;
            }
            Err(source) => return failed(resource, StorageError::Io { path: file, source }),
        }

        let payload = match read_json(file.clone()).await {
            Ok(payload) => payload,
            Err(e) => return failed(resource, e),
        };

        tracing::info!("📥 Installing default {} from {}", resource, file.display());
        match self.store.put(resource, payload).await {
            Ok(()) => SeedOutcome::Installed,
            Err(e) => failed(resource, e),
        }
    }
}

async fn read_json(path: PathBuf) -> Result<Value> {
    let text = tokio::fs::read_to_string(&path)
        .await
        .map_err(|source| StorageError::Io { path: path.clone(), source })?;
    serde_json::from_str(&text).map_err(|source| StorageError::Parse { path, source })
}

fn failed(resource: Resource, err: StorageError) -> SeedOutcome {
    tracing::warn!("❌ Failed to populate default {}: {}", resource, err);
    SeedOutcome::Failed(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::MemoryDocumentClient;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn creates_database_and_views_when_absent() {
        let client = Arc::new(MemoryDocumentClient::new());
        let store = SingletonStore::new(client.clone(), "db", "ns");
        let report = Bootstrap::new(client.as_ref(), "db", "ns", &store, None).run().await.unwrap();

        assert!(report.created_database);
        assert!(client.has_database("db"));
        assert!(client.has_design_document("db", DESIGN_DOC));
        assert_eq!(report.flows, SeedOutcome::Missing);
        assert_eq!(report.credentials, SeedOutcome::Missing);
    }

    #[tokio::test]
    async fn existing_database_is_left_alone() {
        let client = Arc::new(MemoryDocumentClient::with_database("db"));
        let store = SingletonStore::new(client.clone(), "db", "ns");
        let report = Bootstrap::new(client.as_ref(), "db", "ns", &store, None).run().await.unwrap();
        assert!(!report.created_database);
        assert!(!client.has_design_document("db", DESIGN_DOC));
    }

    #[tokio::test]
    async fn unreachable_service_fails_initialization() {
        let client = Arc::new(MemoryDocumentClient::new());
        client.set_unavailable(true);
        let store = SingletonStore::new(client.clone(), "db", "ns");
        let err = Bootstrap::new(client.as_ref(), "db", "ns", &store, None).run().await.unwrap_err();
        assert!(err.to_string().starts_with("checkDatabase failed"));
    }

    #[tokio::test]
    async fn existing_flows_skip_seeding() {
        let client = Arc::new(MemoryDocumentClient::with_database("db"));
        let store = SingletonStore::new(client.clone(), "db", "ns");
        store.put(Resource::Flows, json!([{"id": "keep"}])).await.unwrap();

        let report = Bootstrap::new(client.as_ref(), "db", "ns", &store, Some(Path::new("/nonexistent")))
            .run()
            .await
            .unwrap();
        assert_eq!(report.flows, SeedOutcome::Skipped);
        assert_eq!(report.credentials, SeedOutcome::Skipped);
    }
}
