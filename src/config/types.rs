//! Configuration types for jsmon.
//!
//! Every section deserializes with defaults, so a config file only needs the
//! keys it changes.

use super::defaults::{
    DEFAULT_CONTEXT_MARGIN, DEFAULT_DIFF_TIMEOUT_MS, DEFAULT_FETCH_TIMEOUT_SECS,
    DEFAULT_MAX_RETRIES, DEFAULT_MERGE_GAP, DEFAULT_SMTP_PORT, DEFAULT_WATCH_INTERVAL,
    DEFAULT_WORKERS, default_blob_dir, default_database_path,
};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

// ============================================================================
// Unified Application Configuration
// ============================================================================

/// Top-level configuration loaded from `.jsmon.yaml` and CLI flags.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppConfig {
    /// URLs of the JavaScript packages to monitor
    pub targets: Vec<String>,
    /// Where versions and raw content are persisted
    pub storage: StorageConfig,
    /// HTTP fetching behavior
    pub fetch: FetchConfig,
    /// Change localization settings
    pub diff: DiffConfig,
    /// Alert destinations
    pub alerts: AlertsConfig,
    /// Watch loop settings
    pub watch: WatchConfig,
}

impl AppConfig {
    /// Create a new `AppConfig` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an `AppConfig` builder.
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

// ============================================================================
// Builder for AppConfig
// ============================================================================

/// Builder for constructing `AppConfig` with fluent API.
#[derive(Debug, Default)]
#[must_use]
pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfigBuilder {
    /// Add a monitored URL.
    pub fn target(mut self, url: impl Into<String>) -> Self {
        self.config.targets.push(url.into());
        self
    }

    /// Set the SQLite database path.
    pub fn database(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage.database = Some(path.into());
        self
    }

    /// Set the raw content directory.
    pub fn blob_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage.blob_dir = Some(path.into());
        self
    }

    /// Set the snippet context margin.
    pub const fn context_margin(mut self, margin: usize) -> Self {
        self.config.diff.context_margin = margin;
        self
    }

    /// Set the number of parallel fetch workers.
    pub const fn workers(mut self, workers: usize) -> Self {
        self.config.watch.workers = workers;
        self
    }

    /// Set the watch interval (e.g. `"30m"`).
    pub fn interval(mut self, interval: impl Into<String>) -> Self {
        self.config.watch.interval = interval.into();
        self
    }

    /// Build the configuration.
    #[must_use]
    pub fn build(self) -> AppConfig {
        self.config
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Persistence locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file (default: `<data dir>/jsmon/jsmon.sqlite3`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<PathBuf>,
    /// Directory holding one file per content digest (default: `<data dir>/jsmon/raw`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blob_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolved database path.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(default_database_path)
    }

    /// Resolved blob directory.
    #[must_use]
    pub fn blob_path(&self) -> PathBuf {
        self.blob_dir.clone().unwrap_or_else(default_blob_dir)
    }
}

/// HTTP fetch settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after the first failed attempt
    pub max_retries: u8,
    /// Override the User-Agent header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_FETCH_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            user_agent: None,
        }
    }
}

impl FetchConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Change localization settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct DiffConfig {
    /// Characters of context shown on each side of a change
    pub context_margin: usize,
    /// Changes closer than this many characters are reported together
    pub merge_gap: usize,
    /// Time budget for character-level refinement, in milliseconds
    pub timeout_ms: u64,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            context_margin: DEFAULT_CONTEXT_MARGIN,
            merge_gap: DEFAULT_MERGE_GAP,
            timeout_ms: DEFAULT_DIFF_TIMEOUT_MS,
        }
    }
}

impl DiffConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Alert destinations. Every enabled sink receives every alert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AlertsConfig {
    /// Print alert reports to stderr
    pub stderr: bool,
    /// Append one JSON alert per line to this file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ndjson_file: Option<PathBuf>,
    /// POST JSON alerts to this URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub webhook_url: Option<String>,
    /// Send alert reports by email
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailConfig>,
}

impl Default for AlertsConfig {
    fn default() -> Self {
        Self {
            stderr: true,
            ndjson_file: None,
            webhook_url: None,
            email: None,
        }
    }
}

/// SMTP delivery settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Upgrade the connection with STARTTLS
    pub starttls: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Environment variable holding the SMTP password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,
    pub from: String,
    pub to: Vec<String>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            smtp_host: "localhost".to_string(),
            smtp_port: DEFAULT_SMTP_PORT,
            starttls: false,
            username: None,
            password_env: None,
            from: "jsmon@localhost".to_string(),
            to: Vec::new(),
        }
    }
}

/// Watch loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WatchConfig {
    /// Time between poll cycles (e.g. `30s`, `15m`, `1h`)
    pub interval: String,
    /// Targets fetched in parallel
    pub workers: usize,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_WATCH_INTERVAL.to_string(),
            workers: DEFAULT_WORKERS,
        }
    }
}
