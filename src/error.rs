//! Error types for record loading, configuration and store collaborators

use thiserror::Error;

/// Failure while reading simulation, project or payment records from disk
#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to read records: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed JSON record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed CSV row: {0}")]
    Csv(#[from] csv::Error),
}

/// Failure while loading an engine configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure reported by a document-store collaborator
///
/// These never escape the sourcing coordinator as panics; they are turned
/// into a `NotFound` or `Error` state carrying `to_string()` as the message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("request rejected: {0}")]
    Rejected(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        StoreError::NotFound { kind, id: id.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
