//! Durable version history and raw content storage.
//!
//! The [`VersionStore`] owns the target table and the append-only version
//! history, and exposes classification as a single atomic operation. Raw
//! payloads live separately in a [`BlobStore`] keyed by content digest.
//!
//! Two version store backends are provided:
//!
//! - [`SqliteVersionStore`]: the durable store used by the CLI
//! - [`MemoryVersionStore`]: in-process store for tests and dry runs

mod blob;
pub(crate) mod classify;
mod memory;
mod sqlite;

pub use blob::{BlobStore, FileBlobStore, MemoryBlobStore};
pub use memory::MemoryVersionStore;
pub use sqlite::SqliteVersionStore;

use crate::error::Result;
use crate::model::{Classification, Target, TargetId, VersionRecord};
use chrono::{DateTime, Utc};

/// Persistence of targets and their version histories.
///
/// Implementations must make [`classify`](VersionStore::classify) atomic:
/// the history read and the resulting insert or update either both happen
/// or neither does, and version numbers for one target are never reused.
pub trait VersionStore: Send + Sync {
    /// Register a URL. Registering a known URL returns the existing target
    /// unchanged.
    fn register(&self, url: &str, added_at: DateTime<Utc>) -> Result<Target>;

    /// All registered targets, in registration order.
    fn targets(&self) -> Result<Vec<Target>>;

    /// Look up a single target.
    fn target(&self, target_id: &TargetId) -> Result<Option<Target>>;

    /// Classify an observation and record it.
    ///
    /// Fails with a precondition error when `target_id` is not registered.
    fn classify(
        &self,
        target_id: &TargetId,
        content_digest: &str,
        content_size: usize,
        observed_at: DateTime<Utc>,
    ) -> Result<Classification>;

    /// Version history of a target, most recent first.
    fn history(&self, target_id: &TargetId) -> Result<Vec<VersionRecord>>;

    /// Register every URL in order, skipping duplicates.
    fn register_all(&self, urls: &[String], added_at: DateTime<Utc>) -> Result<usize> {
        let before = self.targets()?.len();
        for url in urls {
            self.register(url, added_at)?;
        }
        let added = self.targets()?.len() - before;
        if added > 0 {
            tracing::info!("{added} new target(s) registered");
        }
        Ok(added)
    }
}
