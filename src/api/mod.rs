/// HTTP API Layer
///
/// REST endpoints over the storage operations: singleton reads and writes,
/// library reads (entry or listing) and library writes.

// Storage endpoints (GET/PUT)
pub mod storage;

// Re-export router builder and state
pub use storage::{create_storage_routes, AppState};
