/// Configuration management for flowdoc storage
///
/// Handles host settings, document database options, service credentials
/// and the HTTP server parameters used by the binary.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default connection identifier used to look up service credentials
pub const DEFAULT_SERVICE_NAME: &str = "NODE_RED_CLOUDANT";
/// Default database name
pub const DEFAULT_DB: &str = "nodered";
/// Default namespace prepended to every document id
pub const DEFAULT_PREFIX: &str = "nodered";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Host settings handed to storage initialization
    pub settings: HostSettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
    /// Serve from the in-memory document store instead of the configured service
    #[serde(default)]
    pub in_memory: bool,
}

/// Settings object provided by the host application
///
/// Only the `cloudantService` section and the user directory are consumed here;
/// everything else the host keeps in its settings is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostSettings {
    /// Storage options, absent means all defaults
    #[serde(default)]
    pub cloudant_service: Option<StorageConfig>,
    /// Host user directory, holds `default/flows.json` and `default/flow_creds.json`
    #[serde(default)]
    pub user_dir: Option<PathBuf>,
}

impl HostSettings {
    /// Effective storage options with defaults applied
    pub fn storage(&self) -> StorageConfig {
        let mut storage = self.cloudant_service.clone().unwrap_or_default();
        if storage.user_dir.is_none() {
            storage.user_dir = self.user_dir.clone();
        }
        storage
    }
}

/// Document database options recognized under `cloudantService`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Database-connection identifier, selects the `<SERVICE>_*` credential variables
    pub service_name: String,
    /// Database name
    pub db: String,
    /// Namespace for all document ids
    pub prefix: String,
    /// Verbose diagnostic logging
    pub debug: bool,
    /// Directory holding default content, overrides the host-level user directory
    pub user_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            db: DEFAULT_DB.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            debug: false,
            user_dir: None,
        }
    }
}

/// How requests to the document service are authenticated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthConfig {
    /// No credentials attached
    None,
    /// HTTP basic authentication
    Basic { username: String, password: String },
    /// IAM API key exchanged for a bearer token at `token_url`
    Iam { api_key: String, token_url: String },
}

/// Default IAM token endpoint
pub const DEFAULT_IAM_TOKEN_URL: &str = "https://iam.cloud.ibm.com/identity/token";

/// Connection details for the document service
///
/// Resolved from environment variables named after the service name:
/// `<SERVICE>_URL`, `<SERVICE>_AUTH_TYPE`, `<SERVICE>_USERNAME`, `<SERVICE>_PASSWORD`,
/// `<SERVICE>_APIKEY` and `<SERVICE>_AUTH_URL`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCredentials {
    /// Base URL of the document service
    pub url: String,
    /// Authentication scheme
    pub auth: AuthConfig,
}

impl ServiceCredentials {
    /// Read credentials for `service_name` from the process environment
    pub fn from_env(service_name: &str) -> anyhow::Result<Self> {
        Self::from_lookup(service_name, |key| std::env::var(key).ok())
    }

    /// Resolve credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(service_name: &str, lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |suffix: &str| lookup(&format!("{}_{}", service_name, suffix));

        let url = var("URL")
            .ok_or_else(|| anyhow::anyhow!("Missing {}_URL for document service", service_name))?;
        let username = var("USERNAME");
        let password = var("PASSWORD");
        let api_key = var("APIKEY");

        let auth_type = var("AUTH_TYPE")
            .map(|t| t.to_lowercase())
            .unwrap_or_else(|| {
                if api_key.is_some() {
                    "iam".to_string()
                } else if username.is_some() {
                    "basic".to_string()
                } else {
                    "noauth".to_string()
                }
            });

        let auth = match auth_type.as_str() {
            "basic" => AuthConfig::Basic {
                username: username
                    .ok_or_else(|| anyhow::anyhow!("Missing {}_USERNAME for basic auth", service_name))?,
                password: password.unwrap_or_default(),
            },
            "iam" => AuthConfig::Iam {
                api_key: api_key
                    .ok_or_else(|| anyhow::anyhow!("Missing {}_APIKEY for IAM auth", service_name))?,
                token_url: var("AUTH_URL").unwrap_or_else(|| DEFAULT_IAM_TOKEN_URL.to_string()),
            },
            "noauth" | "none" => AuthConfig::None,
            other => return Err(anyhow::anyhow!("Unsupported auth type for {}: {}", service_name, other)),
        };

        Ok(Self { url, auth })
    }
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        let storage = StorageConfig {
            service_name: std::env::var("FLOWDOC_SERVICE_NAME")
                .unwrap_or_else(|_| DEFAULT_SERVICE_NAME.to_string()),
            db: std::env::var("FLOWDOC_DB").unwrap_or_else(|_| DEFAULT_DB.to_string()),
            prefix: std::env::var("FLOWDOC_PREFIX").unwrap_or_else(|_| DEFAULT_PREFIX.to_string()),
            debug: std::env::var("FLOWDOC_DEBUG")
                .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            user_dir: std::env::var("FLOWDOC_USER_DIR").ok().map(PathBuf::from),
        };

        Self {
            server: ServerConfig {
                host: std::env::var("FLOWDOC_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("FLOWDOC_PORT")
                    .unwrap_or_else(|_| "3005".to_string())
                    .parse()
                    .unwrap_or(3005),
                in_memory: std::env::var("FLOWDOC_IN_MEMORY")
                    .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
                    .unwrap_or(false),
            },
            settings: HostSettings {
                cloudant_service: Some(storage),
                user_dir: None,
            },
        }
    }
}
