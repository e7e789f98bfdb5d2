//! Monitored targets and their identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier of a target, derived from its URL.
///
/// Used as the foreign key for version records so long URLs are never
/// indexed directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetId(String);

impl TargetId {
    /// Derive the id for a URL.
    #[must_use]
    pub fn for_url(url: &str) -> Self {
        crate::utils::target_id(url)
    }

    /// Wrap an already computed hex id (e.g. read back from storage).
    #[must_use]
    pub fn from_hex(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A monitored remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    pub target_id: TargetId,
    pub url: String,
    pub added_at: DateTime<Utc>,
}

impl Target {
    /// Build a target for a URL, deriving its id.
    #[must_use]
    pub fn new(url: impl Into<String>, added_at: DateTime<Utc>) -> Self {
        let url = url.into();
        Self {
            target_id: TargetId::for_url(&url),
            url,
            added_at,
        }
    }
}
