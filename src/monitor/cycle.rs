//! Per-cycle results.

use crate::model::{PollOutcome, TargetId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What happened to one target during a cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TargetStatus {
    Classified { outcome: PollOutcome, version: u32 },
    Failed { error: String },
}

/// Result of polling one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetResult {
    pub url: String,
    pub target_id: TargetId,
    pub status: TargetStatus,
    /// Whether an alert was produced for this target
    pub alerted: bool,
    /// One entry per sink that failed to deliver the alert
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub delivery_failures: Vec<String>,
    /// Set when a change was recorded but its alert could not be built
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_error: Option<String>,
}

impl TargetResult {
    #[must_use]
    pub const fn outcome(&self) -> Option<PollOutcome> {
        match self.status {
            TargetStatus::Classified { outcome, .. } => Some(outcome),
            TargetStatus::Failed { .. } => None,
        }
    }

    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self.status, TargetStatus::Failed { .. })
    }
}

/// All target results of one cycle, in registration order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<TargetResult>,
}

impl CycleReport {
    #[must_use]
    pub fn summary(&self) -> CycleSummary {
        let mut summary = CycleSummary {
            targets: self.results.len(),
            elapsed_ms: u64::try_from(
                (self.finished_at - self.started_at).num_milliseconds().max(0),
            )
            .unwrap_or(0),
            ..CycleSummary::default()
        };

        for result in &self.results {
            match result.outcome() {
                Some(PollOutcome::FirstSighting) => summary.first_sightings += 1,
                Some(PollOutcome::KnownVersion) => summary.unchanged += 1,
                Some(PollOutcome::NewVersion | PollOutcome::ReusedVersion { .. }) => {
                    summary.changes += 1;
                }
                None => summary.failures += 1,
            }
            summary.delivery_failures += result.delivery_failures.len();
            if result.alert_error.is_some() {
                summary.alert_failures += 1;
            }
        }
        summary
    }

    /// Targets whose content changed this cycle.
    pub fn changed(&self) -> impl Iterator<Item = &TargetResult> {
        self.results
            .iter()
            .filter(|r| r.outcome().is_some_and(|o| o.is_change()))
    }

    /// Targets that could not be polled this cycle.
    pub fn failed(&self) -> impl Iterator<Item = &TargetResult> {
        self.results.iter().filter(|r| r.is_failure())
    }
}

/// Aggregate counts for a cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleSummary {
    pub targets: usize,
    pub first_sightings: usize,
    pub unchanged: usize,
    pub changes: usize,
    pub failures: usize,
    pub delivery_failures: usize,
    /// Recorded changes whose alert could not be built
    pub alert_failures: usize,
    pub elapsed_ms: u64,
}
