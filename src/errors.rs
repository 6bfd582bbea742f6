/// Error taxonomy for document access and storage operations
///
/// `ClientError` is what the document client reports. `StorageError` is what the
/// exposed storage operations return, tagged with the operation that failed.

use std::path::PathBuf;
use thiserror::Error;

/// Failure reported by a document client
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Database, document or view is absent
    #[error("not found: {0}")]
    NotFound(String),
    /// Stale or missing revision token on write
    #[error("document update conflict: {0}")]
    Conflict(String),
    /// Network, auth, malformed request or unexpected response
    #[error("transport error: {0}")]
    Transport(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        ClientError::Transport(err.to_string())
    }
}

/// Failure surfaced by a storage operation
#[derive(Error, Debug)]
pub enum StorageError {
    /// A document operation failed
    #[error("{op} failed: {source}")]
    Operation {
        op: &'static str,
        #[source]
        source: ClientError,
    },
    /// Default content could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Library type is empty or contains a separator
    #[error("invalid library type '{0}'")]
    InvalidType(String),
    /// Default content is not valid JSON
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Wrap a client error with the name of the failing operation
    pub fn op(op: &'static str, source: ClientError) -> Self {
        StorageError::Operation { op, source }
    }

    /// Write was rejected because the revision token was stale
    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Operation { source: ClientError::Conflict(_), .. })
    }

    /// Target resource was absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::Operation { source: ClientError::NotFound(_), .. })
    }
}

/// Result alias for storage operations
pub type Result<T> = std::result::Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_errors_carry_the_operation_name() {
        let err = StorageError::op("saveFlows", ClientError::Conflict("nodered/flow".into()));
        assert_eq!(err.to_string(), "saveFlows failed: document update conflict: nodered/flow");
        assert!(err.is_conflict());
        assert!(!err.is_not_found());
    }
}
