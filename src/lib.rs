/// flowdoc-storage: flow-editor runtime state in a CouchDB/Cloudant database
///
/// Stores flows, credentials, user settings, sessions and a hierarchical library of
/// reusable content as documents, with optimistic concurrency on every write and a
/// directory hierarchy reconstructed from a secondary index.

// Host settings, storage options and service credentials
pub mod config;

// Error taxonomy for client and storage operations
pub mod errors;

// Document client boundary - HTTP and in-memory implementations
pub mod client;

// Singleton documents with revision tracking
pub mod store;

// Library hierarchy - paths, index, cache, resolve/save
pub mod library;

// First-run database provisioning and default content
pub mod bootstrap;

// Facade exposing the storage operations
pub mod storage;

// HTTP API layer - REST endpoints for the storage operations
pub mod api;

// Server setup and initialization
pub mod server;

// Re-export commonly used types for external consumers
pub use bootstrap::{BootstrapReport, SeedOutcome};
pub use client::{CloudantClient, DocumentClient, MemoryDocumentClient};
pub use config::{HostSettings, StorageConfig};
pub use errors::{ClientError, StorageError};
pub use library::{LibraryEntry, LibraryValue, ListingItem};
pub use server::start_server;
pub use storage::FlowStorage;
pub use store::Resource;
