//! Alert payload handed to reporters and alert sinks.

use crate::model::{Classification, PollOutcome, Snippet, Target, TargetId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Everything known about one detected content change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeAlert {
    pub url: String,
    pub target_id: TargetId,
    pub outcome: PollOutcome,
    /// Version that was current before the change
    pub previous_version: Option<u32>,
    /// Version recorded for the new content
    pub version: Option<u32>,
    pub old_digest: Option<String>,
    pub new_digest: String,
    pub detected_at: DateTime<Utc>,
    pub snippets: Vec<Snippet>,
}

impl ChangeAlert {
    /// Build the alert for a classified change of `target`.
    #[must_use]
    pub fn from_classification(
        target: &Target,
        classification: &Classification,
        new_digest: &str,
        detected_at: DateTime<Utc>,
        snippets: Vec<Snippet>,
    ) -> Self {
        Self {
            url: target.url.clone(),
            target_id: target.target_id.clone(),
            outcome: classification.outcome,
            previous_version: classification.previous.as_ref().map(|p| p.version),
            version: Some(classification.version),
            old_digest: classification
                .previous
                .as_ref()
                .map(|p| p.content_digest.clone()),
            new_digest: new_digest.to_string(),
            detected_at,
            snippets,
        }
    }

    /// Number of distinct changes reported.
    #[must_use]
    pub fn change_count(&self) -> usize {
        self.snippets.len()
    }
}
