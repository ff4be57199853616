//! Stored record envelope.

use crate::{CollectionName, NaturalKey, Timestamp, Version};
use serde::{Deserialize, Serialize};

/// Metadata associated with a stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// When the record was first inserted (milliseconds since epoch)
    pub created_at: Timestamp,
    /// When the record was last written (milliseconds since epoch)
    pub updated_at: Timestamp,
}

impl Metadata {
    pub fn new(timestamp: Timestamp) -> Self {
        Self {
            created_at: timestamp,
            updated_at: timestamp,
        }
    }

    pub fn touch(&mut self, timestamp: Timestamp) {
        self.updated_at = timestamp;
    }
}

/// A canonical entity as held by the store: its key, a JSON payload and
/// bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Platform-qualified natural key
    pub key: NaturalKey,
    /// Collection this record belongs to
    pub collection: CollectionName,
    /// Version number, incremented on each update
    pub version: Version,
    /// The serialized entity
    pub payload: serde_json::Value,
    pub metadata: Metadata,
}

impl Record {
    /// Create a new record at version 1.
    pub fn new(
        key: NaturalKey,
        collection: impl Into<CollectionName>,
        payload: serde_json::Value,
        timestamp: Timestamp,
    ) -> Self {
        Self {
            key,
            collection: collection.into(),
            version: 1,
            payload,
            metadata: Metadata::new(timestamp),
        }
    }

    /// Replace the payload and bump the version.
    pub fn update_payload(&mut self, payload: serde_json::Value, timestamp: Timestamp) {
        self.payload = payload;
        self.version += 1;
        self.metadata.touch(timestamp);
    }
}
