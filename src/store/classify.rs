//! Pure classification of an observed digest against a target's history.
//!
//! Both store backends load the history, call [`decide`], and apply the
//! resulting [`Decision`] inside one atomic section.

use crate::model::{PollOutcome, VersionRecord};

/// What the store must do for one observation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Decision {
    /// No history: insert version 1.
    FirstSighting,
    /// Digest equals the current version: bump its `last_seen`.
    Touch { version: u32 },
    /// Digest differs from the current version: append `next_version`.
    Append {
        outcome: PollOutcome,
        next_version: u32,
        previous: VersionRecord,
    },
}

impl Decision {
    pub(crate) const fn outcome(&self) -> PollOutcome {
        match self {
            Self::FirstSighting => PollOutcome::FirstSighting,
            Self::Touch { .. } => PollOutcome::KnownVersion,
            Self::Append { outcome, .. } => *outcome,
        }
    }

    pub(crate) const fn version(&self) -> u32 {
        match self {
            Self::FirstSighting => 1,
            Self::Touch { version } => *version,
            Self::Append { next_version, .. } => *next_version,
        }
    }
}

/// Classify `digest` against `history`, which must be ordered by version
/// descending (current version first).
///
/// A digest matching any non-current record is a rollback, however far back
/// that record is.
pub(crate) fn decide(history: &[VersionRecord], digest: &str) -> Decision {
    let Some(current) = history.first() else {
        return Decision::FirstSighting;
    };

    if current.content_digest == digest {
        return Decision::Touch {
            version: current.version,
        };
    }

    let outcome = history[1..]
        .iter()
        .find(|r| r.content_digest == digest)
        .map_or(PollOutcome::NewVersion, |r| PollOutcome::ReusedVersion {
            reverted_to: r.version,
        });

    Decision::Append {
        outcome,
        next_version: current.version + 1,
        previous: current.clone(),
    }
}
