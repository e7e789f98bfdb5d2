//! In-memory version store.

use super::VersionStore;
use super::classify::{Decision, decide};
use crate::error::{MonitorError, Result, StoreErrorKind};
use crate::model::{Classification, Target, TargetId, VersionRecord};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    targets: IndexMap<TargetId, Target>,
    /// Per-target history, oldest first
    versions: IndexMap<TargetId, Vec<VersionRecord>>,
}

/// Version store kept entirely in memory.
///
/// A single write lock covers each classification, which keeps version
/// assignment atomic across threads.
#[derive(Debug, Default)]
pub struct MemoryVersionStore {
    tables: RwLock<Tables>,
}

impl MemoryVersionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(_: T) -> MonitorError {
    MonitorError::store("memory store", StoreErrorKind::Poisoned)
}

impl VersionStore for MemoryVersionStore {
    fn register(&self, url: &str, added_at: DateTime<Utc>) -> Result<Target> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        let candidate = Target::new(url, added_at);
        let target = tables
            .targets
            .entry(candidate.target_id.clone())
            .or_insert(candidate)
            .clone();
        Ok(target)
    }

    fn targets(&self) -> Result<Vec<Target>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.targets.values().cloned().collect())
    }

    fn target(&self, target_id: &TargetId) -> Result<Option<Target>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables.targets.get(target_id).cloned())
    }

    fn classify(
        &self,
        target_id: &TargetId,
        content_digest: &str,
        content_size: usize,
        observed_at: DateTime<Utc>,
    ) -> Result<Classification> {
        let mut tables = self.tables.write().map_err(poisoned)?;
        if !tables.targets.contains_key(target_id) {
            return Err(MonitorError::precondition(format!(
                "classify called for unregistered target {target_id}"
            )));
        }

        let records = tables.versions.entry(target_id.clone()).or_default();
        let history: Vec<VersionRecord> = records.iter().rev().cloned().collect();
        let decision = decide(&history, content_digest);
        let outcome = decision.outcome();
        let version = decision.version();

        let previous = match decision {
            Decision::Touch { .. } => {
                if let Some(current) = records.last_mut() {
                    current.last_seen = observed_at;
                }
                None
            }
            Decision::FirstSighting => {
                records.push(new_record(target_id, version, content_digest, content_size, observed_at));
                None
            }
            Decision::Append { previous, .. } => {
                records.push(new_record(target_id, version, content_digest, content_size, observed_at));
                Some(previous)
            }
        };

        Ok(Classification {
            outcome,
            version,
            previous,
        })
    }

    fn history(&self, target_id: &TargetId) -> Result<Vec<VersionRecord>> {
        let tables = self.tables.read().map_err(poisoned)?;
        Ok(tables
            .versions
            .get(target_id)
            .map(|v| v.iter().rev().cloned().collect())
            .unwrap_or_default())
    }
}

fn new_record(
    target_id: &TargetId,
    version: u32,
    digest: &str,
    size: usize,
    observed_at: DateTime<Utc>,
) -> VersionRecord {
    VersionRecord {
        target_id: target_id.clone(),
        version,
        content_digest: digest.to_string(),
        content_size: size,
        first_seen: observed_at,
        last_seen: observed_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PollOutcome;

    #[test]
    fn test_register_is_idempotent() {
        let store = MemoryVersionStore::new();
        let t0 = Utc::now();
        let a = store.register("https://cdn.example.com/a.js", t0).unwrap();
        let b = store
            .register("https://cdn.example.com/a.js", t0 + chrono::Duration::seconds(5))
            .unwrap();
        assert_eq!(a, b);
        assert_eq!(store.targets().unwrap().len(), 1);
    }

    #[test]
    fn test_classify_unregistered_is_precondition() {
        let store = MemoryVersionStore::new();
        let err = store
            .classify(&TargetId::from_hex("nope"), "d", 1, Utc::now())
            .unwrap_err();
        assert!(matches!(err, MonitorError::Precondition(_)));
    }

    #[test]
    fn test_known_version_only_moves_last_seen() {
        let store = MemoryVersionStore::new();
        let t0 = Utc::now();
        let target = store.register("https://cdn.example.com/a.js", t0).unwrap();
        store.classify(&target.target_id, "aaa", 3, t0).unwrap();

        let t1 = t0 + chrono::Duration::minutes(5);
        let c = store.classify(&target.target_id, "aaa", 3, t1).unwrap();
        assert_eq!(c.outcome, PollOutcome::KnownVersion);
        assert_eq!(c.version, 1);
        assert!(c.previous.is_none());

        let history = store.history(&target.target_id).unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].first_seen, t0);
        assert_eq!(history[0].last_seen, t1);
    }

    #[test]
    fn test_targets_keep_registration_order() {
        let store = MemoryVersionStore::new();
        let now = Utc::now();
        for url in ["https://z.example/z.js", "https://a.example/a.js", "https://m.example/m.js"] {
            store.register(url, now).unwrap();
        }
        let urls: Vec<String> = store.targets().unwrap().into_iter().map(|t| t.url).collect();
        assert_eq!(
            urls,
            ["https://z.example/z.js", "https://a.example/a.js", "https://m.example/m.js"]
        );
    }
}
