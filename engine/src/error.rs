//! Error types for the reconciliation engine.

use crate::{CollectionName, NaturalKey};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// All possible errors from the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum Error {
    // Mapping errors
    #[error("cannot map record {record}: {reason}")]
    RecordMapping { record: String, reason: String },

    #[error("invalid natural key: {0}")]
    InvalidKey(String),

    // Store errors
    #[error("record already exists in {collection}: {key}")]
    RecordAlreadyExists {
        collection: CollectionName,
        key: NaturalKey,
    },

    #[error("record not found in {collection}: {key}")]
    RecordNotFound {
        collection: CollectionName,
        key: NaturalKey,
    },

    #[error("cannot persist {collection} {key}: {reason}")]
    Persistence {
        collection: CollectionName,
        key: String,
        reason: String,
    },

    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl Error {
    /// Shorthand for a record-level mapping failure.
    pub fn mapping(record: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::RecordMapping {
            record: record.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from the store rather than from the source payload.
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            Error::Persistence { .. }
                | Error::RecordAlreadyExists { .. }
                | Error::RecordNotFound { .. }
                | Error::Serialization(_)
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
