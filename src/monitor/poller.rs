//! Single-target polling and the parallel poll cycle.

use super::cycle::{CycleReport, TargetResult, TargetStatus};
use crate::alerts::AlertSink;
use crate::diff::TextDiffEngine;
use crate::error::{ErrorContext, MonitorError, OptionContext, Result};
use crate::fetch::Fetcher;
use crate::model::{Classification, Target};
use crate::reports::{ChangeAlert, ReportGenerator, TextReporter};
use crate::snippet::{self, DEFAULT_CONTEXT_MARGIN};
use crate::store::{BlobStore, VersionStore};
use crate::utils::{ContentDigest, content_digest};
use chrono::{DateTime, Utc};
use rayon::prelude::*;
use std::sync::Arc;

/// An alert ready to hand to the sinks.
#[derive(Debug, Clone)]
pub struct PendingAlert {
    pub alert: ChangeAlert,
    /// Rendered text report
    pub report: String,
}

/// Outcome of polling one target.
#[derive(Debug, Clone)]
pub struct PollResult {
    pub classification: Classification,
    pub digest: ContentDigest,
    /// Present when the content changed from the current version
    pub alert: Option<PendingAlert>,
    /// Why no alert could be built for a recorded change
    pub alert_error: Option<String>,
}

/// Drives fetch, classification and change localization for all targets.
pub struct Monitor {
    store: Arc<dyn VersionStore>,
    blobs: Arc<dyn BlobStore>,
    fetcher: Arc<dyn Fetcher>,
    engine: TextDiffEngine,
    context_margin: usize,
    workers: usize,
}

impl Monitor {
    #[must_use]
    pub fn new(
        store: Arc<dyn VersionStore>,
        blobs: Arc<dyn BlobStore>,
        fetcher: Arc<dyn Fetcher>,
    ) -> Self {
        Self {
            store,
            blobs,
            fetcher,
            engine: TextDiffEngine::new(),
            context_margin: DEFAULT_CONTEXT_MARGIN,
            workers: crate::config::DEFAULT_WORKERS,
        }
    }

    #[must_use]
    pub const fn with_engine(mut self, engine: TextDiffEngine) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub const fn with_context_margin(mut self, margin: usize) -> Self {
        self.context_margin = margin;
        self
    }

    /// Number of targets polled concurrently (at least one).
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn store(&self) -> &dyn VersionStore {
        self.store.as_ref()
    }

    /// Register URLs as targets, returning how many were new.
    pub fn register_targets(&self, urls: &[String]) -> Result<usize> {
        self.store.register_all(urls, Utc::now())
    }

    /// Fetch and process one target.
    pub fn poll_target(&self, target: &Target) -> Result<PollResult> {
        let content = self.fetcher.fetch(&target.url)?;
        self.process_content(target, &content, Utc::now())
    }

    /// Process already-fetched content for `target` observed at `observed_at`.
    ///
    /// The raw payload is stored before classification, so the content of
    /// every recorded version is always retrievable. Once classification has
    /// committed, failing to build the alert no longer fails the poll: the
    /// error is returned in [`PollResult::alert_error`] next to the recorded
    /// classification.
    pub fn process_content(
        &self,
        target: &Target,
        content: &[u8],
        observed_at: DateTime<Utc>,
    ) -> Result<PollResult> {
        let digest = content_digest(content);
        self.blobs
            .put(&digest.digest, content)
            .with_context(|| format!("storing content of {}", target.url))?;

        let classification = self
            .store
            .classify(&target.target_id, &digest.digest, digest.size, observed_at)
            .with_context(|| format!("classifying {}", target.url))?;

        let (alert, alert_error) = if classification.outcome.is_change() {
            tracing::info!(
                "{}: {} (version {})",
                target.url,
                classification.outcome,
                classification.version
            );
            match self.prepare_alert(target, &classification, &digest, content, observed_at) {
                Ok(pending) => (Some(pending), None),
                Err(err) => {
                    tracing::error!(
                        "{}: version {} recorded but no alert could be built: {err}",
                        target.url,
                        classification.version
                    );
                    (None, Some(error_chain(&err)))
                }
            }
        } else {
            tracing::debug!(
                "{}: {} (version {})",
                target.url,
                classification.outcome,
                classification.version
            );
            (None, None)
        };

        Ok(PollResult {
            classification,
            digest,
            alert,
            alert_error,
        })
    }

    fn prepare_alert(
        &self,
        target: &Target,
        classification: &Classification,
        digest: &ContentDigest,
        content: &[u8],
        observed_at: DateTime<Utc>,
    ) -> Result<PendingAlert> {
        let previous = classification
            .previous
            .as_ref()
            .with_context_none(|| format!("{} changed without a previous version", target.url))?;

        let old_text = self.blobs.get_text(&previous.content_digest)?.with_context_none(|| {
            format!(
                "content of {} version {} ({}) is missing from the blob store",
                target.url, previous.version, previous.content_digest
            )
        })?;
        let new_text = String::from_utf8_lossy(content);

        let spans = self.engine.diff(&old_text, &new_text);
        let snippets = snippet::extract(&old_text, &new_text, &spans, self.context_margin);

        let alert = ChangeAlert::from_classification(
            target,
            classification,
            &digest.digest,
            observed_at,
            snippets,
        );
        let report = TextReporter::new()
            .generate(&alert)
            .map_err(|e| MonitorError::report(format!("alert for {}: {e}", target.url)))?;

        Ok(PendingAlert { alert, report })
    }

    /// Poll every registered target once and deliver alerts to `sinks`.
    ///
    /// Targets are fetched and classified in parallel on a pool of
    /// `workers` threads; alerts are delivered afterwards in registration
    /// order. A failure of one target never affects the others, and a
    /// failed delivery never undoes the recorded version.
    pub fn run_cycle(&self, sinks: &mut [Box<dyn AlertSink>]) -> Result<CycleReport> {
        let started_at = Utc::now();
        let targets = self.store.targets()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("jsmon-poll-{i}"))
            .build()
            .map_err(|e| MonitorError::config(format!("creating worker pool: {e}")))?;

        let polled: Vec<Result<PollResult>> =
            pool.install(|| targets.par_iter().map(|t| self.poll_target(t)).collect());

        let results = targets
            .iter()
            .zip(polled)
            .map(|(target, outcome)| match outcome {
                Ok(poll) => {
                    let delivery_failures = poll
                        .alert
                        .as_ref()
                        .map(|pending| deliver(pending, sinks))
                        .unwrap_or_default();
                    TargetResult {
                        url: target.url.clone(),
                        target_id: target.target_id.clone(),
                        status: TargetStatus::Classified {
                            outcome: poll.classification.outcome,
                            version: poll.classification.version,
                        },
                        alerted: poll.alert.is_some(),
                        delivery_failures,
                        alert_error: poll.alert_error,
                    }
                }
                Err(err) => {
                    tracing::warn!("{}: {err}", target.url);
                    TargetResult {
                        url: target.url.clone(),
                        target_id: target.target_id.clone(),
                        status: TargetStatus::Failed {
                            error: error_chain(&err),
                        },
                        alerted: false,
                        delivery_failures: Vec::new(),
                        alert_error: None,
                    }
                }
            })
            .collect();

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            results,
        };

        let summary = report.summary();
        for sink in sinks.iter_mut() {
            if let Err(e) = sink.on_cycle(&summary) {
                tracing::warn!("Alert sink {} status error: {e:#}", sink.name());
            }
        }

        Ok(report)
    }
}

/// Hand one alert to every sink, returning a message per failed sink.
fn deliver(pending: &PendingAlert, sinks: &mut [Box<dyn AlertSink>]) -> Vec<String> {
    let mut failures = Vec::new();
    for sink in sinks.iter_mut() {
        if let Err(e) = sink.deliver(&pending.alert, &pending.report) {
            let err = MonitorError::delivery(sink.name(), format!("{e:#}"));
            tracing::warn!("{}: {err}", pending.alert.url);
            failures.push(err.to_string());
        }
    }
    failures
}

/// Render an error with its sources, `outer: inner: root`.
fn error_chain(err: &MonitorError) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;
    use crate::model::PollOutcome;
    use crate::store::{MemoryBlobStore, MemoryVersionStore};
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapFetcher(Mutex<HashMap<String, Vec<u8>>>);

    impl Fetcher for MapFetcher {
        fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.0
                .lock()
                .unwrap()
                .get(url)
                .cloned()
                .ok_or_else(|| MonitorError::fetch(url, FetchErrorKind::Status(404)))
        }
    }

    fn monitor() -> (Monitor, Arc<MemoryBlobStore>) {
        let blobs = Arc::new(MemoryBlobStore::new());
        let fetcher = MapFetcher(Mutex::new(HashMap::new()));
        let monitor = Monitor::new(
            Arc::new(MemoryVersionStore::new()),
            blobs.clone(),
            Arc::new(fetcher),
        );
        (monitor, blobs)
    }

    #[test]
    fn test_process_content_stores_blob_before_classifying() {
        let (monitor, blobs) = monitor();
        let target = monitor.store().register("https://a.example/x.js", Utc::now()).unwrap();

        let result = monitor
            .process_content(&target, b"var x=1;", Utc::now())
            .unwrap();
        assert_eq!(result.classification.outcome, PollOutcome::FirstSighting);
        assert!(result.alert.is_none());
        assert_eq!(blobs.len(), 1);
    }

    #[test]
    fn test_change_produces_alert() {
        let (monitor, _) = monitor();
        let target = monitor.store().register("https://a.example/x.js", Utc::now()).unwrap();
        monitor.process_content(&target, b"var x=1;", Utc::now()).unwrap();

        let result = monitor
            .process_content(&target, b"var x=2;", Utc::now())
            .unwrap();
        let pending = result.alert.unwrap();
        assert_eq!(pending.alert.previous_version, Some(1));
        assert_eq!(pending.alert.version, Some(2));
        assert_eq!(pending.alert.snippets.len(), 1);
        assert!(pending.report.contains("# Change 1 of 1"));
    }

    #[test]
    fn test_missing_previous_blob_keeps_recorded_version() {
        let store = Arc::new(MemoryVersionStore::new());
        let target = store.register("https://a.example/x.js", Utc::now()).unwrap();
        // History recorded without the payload ever reaching the blob store.
        let digest = content_digest(b"var x=1;");
        store
            .classify(&target.target_id, &digest.digest, digest.size, Utc::now())
            .unwrap();

        let monitor = Monitor::new(
            store,
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MapFetcher(Mutex::new(HashMap::new()))),
        );
        let result = monitor
            .process_content(&target, b"var x=2;", Utc::now())
            .unwrap();
        assert_eq!(result.classification.outcome, PollOutcome::NewVersion);
        assert_eq!(result.classification.version, 2);
        assert!(result.alert.is_none());
        let error = result.alert_error.unwrap();
        assert!(error.starts_with("Precondition violated"), "{error}");
        assert!(error.contains("missing from the blob store"), "{error}");
    }

    #[test]
    fn test_error_chain_includes_source() {
        let err = MonitorError::fetch("https://a.example/x.js", FetchErrorKind::Status(503));
        let text = error_chain(&err);
        assert!(text.contains("https://a.example/x.js"));
        assert!(text.contains("503"));
    }
}
