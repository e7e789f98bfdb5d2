//! **Integrity monitoring for remotely hosted JavaScript packages.**
//!
//! `jsmon` polls third-party JavaScript served to public-facing websites,
//! keeps a durable version history of each script's content, and when the
//! content changes, pinpoints exactly which characters changed so a reviewer
//! sees a handful of short before/after snippets instead of two minified
//! bundles.
//!
//! ## Core Concepts & Modules
//!
//! - **[`utils`]**: content digests ([`content_digest`]) and target ids.
//! - **[`store`]**: the [`VersionStore`] that classifies each observation as a
//!   first sighting, known version, new version or rollback to an older
//!   version, plus the [`BlobStore`] holding raw payloads.
//! - **[`diff`]**: the [`TextDiffEngine`], producing character-level
//!   [`ChangeSpan`]s between two texts.
//! - **[`snippet`]**: bounded before/after windows around each change.
//! - **[`reports`]**: the plain-text alert body and a structured JSON alert.
//! - **[`alerts`]**: stderr, NDJSON, webhook and email sinks.
//! - **[`monitor`]**: the poll cycle and watch loop tying it all together.
//!
//! ## Localizing a change
//!
//! ```
//! use jsmon::{TextDiffEngine, snippet, reports::format_report};
//!
//! let old = "function load(){fetch('/api/v1')}";
//! let new = "function load(){fetch('https://evil.example/c')}";
//!
//! let spans = TextDiffEngine::new().diff(old, new);
//! let snippets = snippet::extract(old, new, &spans, 10);
//! let report = format_report("https://cdn.example.com/app.js", &snippets);
//!
//! assert!(report.contains("# Change 1 of 1"));
//! ```
//!
//! ## Classifying observations
//!
//! ```
//! use jsmon::store::{MemoryVersionStore, VersionStore};
//! use jsmon::model::PollOutcome;
//! use jsmon::content_digest;
//! use chrono::Utc;
//!
//! let store = MemoryVersionStore::new();
//! let target = store.register("https://cdn.example.com/app.js", Utc::now())?;
//!
//! for (body, expected) in [
//!     ("var x=1;", PollOutcome::FirstSighting),
//!     ("var x=2;", PollOutcome::NewVersion),
//!     ("var x=1;", PollOutcome::ReusedVersion { reverted_to: 1 }),
//! ] {
//!     let d = content_digest(body.as_bytes());
//!     let c = store.classify(&target.target_id, &d.digest, d.size, Utc::now())?;
//!     assert_eq!(c.outcome, expected);
//! }
//! # Ok::<(), jsmon::MonitorError>(())
//! ```

// Lint to discourage unwrap() in production code - prefer explicit error handling
#![warn(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    // `old`/`new` pairs are clear in context
    clippy::similar_names
)]

pub mod alerts;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod fetch;
pub mod model;
pub mod monitor;
pub mod reports;
pub mod snippet;
pub mod store;
pub mod utils;

// Re-export main types for convenience
pub use config::{AppConfig, AppConfigBuilder, ConfigError, Validatable};
pub use diff::TextDiffEngine;
pub use error::{ErrorContext, MonitorError, OptionContext, Result};
pub use fetch::Fetcher;
pub use model::{ChangeSpan, Classification, PollOutcome, Snippet, Target, TargetId, VersionRecord};
pub use monitor::{CycleReport, Monitor, run_watch_loop};
pub use reports::{ChangeAlert, ReportFormat, ReportGenerator};
pub use store::{BlobStore, VersionStore};
pub use utils::{ContentDigest, content_digest, target_id};
