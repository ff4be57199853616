//! Platform discriminator and platform-qualified natural keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one external marketplace.
///
/// Every canonical entity carries one, and every natural key is qualified by
/// it, so two marketplaces may reuse the same business identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlatformId(String);

impl PlatformId {
    /// Create a platform id. Ids are case-insensitive and stored lowercase.
    pub fn new(id: impl AsRef<str>) -> Self {
        Self(id.as_ref().trim().to_ascii_lowercase())
    }

    /// The Trendyol marketplace.
    pub fn trendyol() -> Self {
        Self::new("trendyol")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlatformId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlatformId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Business identity of a record: the source identifier scoped to its platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaturalKey {
    pub platform: PlatformId,
    pub value: String,
}

impl NaturalKey {
    pub fn new(platform: PlatformId, value: impl Into<String>) -> Self {
        Self {
            platform,
            value: value.into(),
        }
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.platform, self.value)
    }
}
