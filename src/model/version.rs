//! Version history records and poll classification outcomes.

use super::TargetId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One observed distinct content state of a target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    pub target_id: TargetId,
    /// 1-based, strictly increasing per target in first-seen order
    pub version: u32,
    pub content_digest: String,
    /// Length of the content in chars at capture time
    pub content_size: usize,
    pub first_seen: DateTime<Utc>,
    /// Advanced whenever this version is re-observed while current
    pub last_seen: DateTime<Utc>,
}

/// Result of classifying one observation against a target's history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PollOutcome {
    /// No prior history; version 1 was recorded
    FirstSighting,
    /// Same digest as the current version; only `last_seen` moved
    KnownVersion,
    /// Digest never seen before for this target
    NewVersion,
    /// Digest matches an older, non-current version (a rollback)
    ReusedVersion {
        /// Highest older version carrying the same digest
        reverted_to: u32,
    },
}

impl PollOutcome {
    /// Whether a new version record was appended and a diff should be produced.
    #[must_use]
    pub const fn is_change(&self) -> bool {
        matches!(self, Self::NewVersion | Self::ReusedVersion { .. })
    }

    /// Short machine-friendly label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::FirstSighting => "first_sighting",
            Self::KnownVersion => "known_version",
            Self::NewVersion => "new_version",
            Self::ReusedVersion { .. } => "reused_version",
        }
    }
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FirstSighting => write!(f, "first sighting"),
            Self::KnownVersion => write!(f, "known version"),
            Self::NewVersion => write!(f, "NEW VERSION"),
            Self::ReusedVersion { reverted_to } => {
                write!(f, "ROLLBACK to version {reverted_to}")
            }
        }
    }
}

/// Classification of one observation, as returned by the version store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub outcome: PollOutcome,
    /// Current version number after classification
    pub version: u32,
    /// The record that was current before a new version was appended
    pub previous: Option<VersionRecord>,
}
