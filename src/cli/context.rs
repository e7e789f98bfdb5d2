//! Wiring of stores, fetcher and monitor from configuration.

use crate::config::AppConfig;
use crate::diff::TextDiffEngine;
use crate::fetch::build_fetcher;
use crate::monitor::Monitor;
use crate::store::{BlobStore, FileBlobStore, SqliteVersionStore, VersionStore};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Opened persistence for CLI commands.
pub struct Runtime {
    pub store: Arc<dyn VersionStore>,
    pub blobs: Arc<dyn BlobStore>,
}

/// Open the configured version store and blob directory.
pub fn open_runtime(config: &AppConfig) -> Result<Runtime> {
    let db_path = config.storage.database_path();
    let store = SqliteVersionStore::open(&db_path)
        .with_context(|| format!("opening version store {}", db_path.display()))?;

    let blob_dir = config.storage.blob_path();
    let blobs = FileBlobStore::new(blob_dir.clone())
        .with_context(|| format!("opening blob directory {}", blob_dir.display()))?;

    tracing::debug!(
        "Using database {} and blobs in {}",
        db_path.display(),
        blob_dir.display()
    );

    Ok(Runtime {
        store: Arc::new(store),
        blobs: Arc::new(blobs),
    })
}

impl Runtime {
    /// Diff engine configured from the `diff` section.
    #[must_use]
    pub fn engine(config: &AppConfig) -> TextDiffEngine {
        TextDiffEngine::new()
            .with_merge_gap(config.diff.merge_gap)
            .with_timeout(config.diff.timeout())
    }

    /// Build a monitor over this runtime and register the configured targets.
    pub fn monitor(&self, config: &AppConfig) -> Result<Monitor> {
        let fetcher = build_fetcher(&config.fetch).context("creating HTTP fetcher")?;
        let monitor = Monitor::new(
            Arc::clone(&self.store),
            Arc::clone(&self.blobs),
            Arc::from(fetcher),
        )
        .with_engine(Self::engine(config))
        .with_context_margin(config.diff.context_margin)
        .with_workers(config.watch.workers);

        monitor
            .register_targets(&config.targets)
            .context("registering targets")?;
        Ok(monitor)
    }
}
