/// Flow storage facade
///
/// The operations the flow editor calls: initialization, the four singleton
/// get/save pairs and library get/save. Each instance owns its revision tracker and
/// library cache, so two instances never share concurrency state.

use crate::bootstrap::{Bootstrap, BootstrapReport};
use crate::client::{CloudantClient, DocumentClient};
use crate::config::{HostSettings, ServiceCredentials};
use crate::errors::Result;
use crate::library::{LibraryIndex, LibraryValue};
use crate::store::{Resource, SingletonStore};
use serde_json::Value;
use std::sync::Arc;

pub struct FlowStorage {
    singletons: SingletonStore,
    library: LibraryIndex,
    report: BootstrapReport,
}

impl FlowStorage {
    /// Initialize against the document service named in the settings
    ///
    /// Credentials come from the `<serviceName>_*` environment variables.
    pub async fn connect(settings: &HostSettings) -> anyhow::Result<Self> {
        let config = settings.storage();
        let credentials = ServiceCredentials::from_env(&config.service_name)?;
        let client = CloudantClient::new(credentials)
            .map_err(|e| anyhow::anyhow!("Failed to create document client: {}", e))?;
        Ok(Self::initialize(settings, Arc::new(client)).await?)
    }

    /// Initialize with an explicit document client
    ///
    /// Creates the database and its views when missing and installs default content
    /// when no flows exist yet. Fails only if the database cannot be verified or
    /// created or the views cannot be installed.
    pub async fn initialize(settings: &HostSettings, client: Arc<dyn DocumentClient>) -> Result<Self> {
        let config = settings.storage();

        if config.debug {
            tracing::info!("🔧 debug: {}", config.debug);
            tracing::info!("🔧 service name: {}", config.service_name);
            tracing::info!("🔧 prefix: {}", config.prefix);
            tracing::info!("🔧 database: {}", config.db);
        }

        let singletons = SingletonStore::new(Arc::clone(&client), config.db.clone(), config.prefix.clone());
        let library = LibraryIndex::new(Arc::clone(&client), config.db.clone(), config.prefix.clone());

        let report = Bootstrap::new(
            client.as_ref(),
            &config.db,
            &config.prefix,
            &singletons,
            config.user_dir.as_deref(),
        )
        .run()
        .await?;

        tracing::info!("✅ Flow storage ready (db: {}, prefix: {})", config.db, config.prefix);

        Ok(Self { singletons, library, report })
    }

    /// What initialization did
    pub fn bootstrap_report(&self) -> &BootstrapReport {
        &self.report
    }

    pub fn singletons(&self) -> &SingletonStore {
        &self.singletons
    }

    pub fn library(&self) -> &LibraryIndex {
        &self.library
    }

    pub async fn get_flows(&self) -> Result<Value> {
        self.singletons.get(Resource::Flows).await
    }

    pub async fn save_flows(&self, flows: Value) -> Result<()> {
        self.singletons.put(Resource::Flows, flows).await
    }

    pub async fn get_credentials(&self) -> Result<Value> {
        self.singletons.get(Resource::Credentials).await
    }

    pub async fn save_credentials(&self, credentials: Value) -> Result<()> {
        self.singletons.put(Resource::Credentials, credentials).await
    }

    pub async fn get_settings(&self) -> Result<Value> {
        self.singletons.get(Resource::Settings).await
    }

    pub async fn save_settings(&self, settings: Value) -> Result<()> {
        self.singletons.put(Resource::Settings, settings).await
    }

    pub async fn get_sessions(&self) -> Result<Value> {
        self.singletons.get(Resource::Sessions).await
    }

    pub async fn save_sessions(&self, sessions: Value) -> Result<()> {
        self.singletons.put(Resource::Sessions, sessions).await
    }

    /// Entry at `path`, or the listing of the directory at `path`
    pub async fn get_library_entry(&self, lib_type: &str, path: &str) -> Result<LibraryValue> {
        self.library.resolve(lib_type, path).await
    }

    pub async fn save_library_entry(&self, lib_type: &str, path: &str, meta: Value, body: Value) -> Result<()> {
        self.library.save(lib_type, path, meta, body).await
    }
}
