//! Configuration file loading and discovery.
//!
//! Supports loading configuration from YAML files with automatic discovery.

use super::types::AppConfig;
use std::path::{Path, PathBuf};

// ============================================================================
// Configuration File Discovery
// ============================================================================

/// Standard config file names to search for.
pub const CONFIG_FILE_NAMES: &[&str] = &[".jsmon.yaml", ".jsmon.yml", "jsmon.yaml", "jsmon.yml"];

/// Discover a config file by searching standard locations.
///
/// Search order:
/// 1. Explicit path if provided
/// 2. Current directory
/// 3. Git repository root (if in a repo)
/// 4. User config directory (~/.config/jsmon/)
/// 5. Home directory
#[must_use]
pub fn discover_config_file(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path
        && path.exists()
    {
        return Some(path.to_path_buf());
    }

    if let Ok(cwd) = std::env::current_dir()
        && let Some(path) = find_config_in_dir(&cwd)
    {
        return Some(path);
    }

    if let Some(git_root) = find_git_root()
        && let Some(path) = find_config_in_dir(&git_root)
    {
        return Some(path);
    }

    if let Some(dir) = user_config_dir()
        && let Some(path) = find_config_in_dir(&dir)
    {
        return Some(path);
    }

    dirs::home_dir().and_then(|home| find_config_in_dir(&home))
}

/// Per-user configuration directory (`~/.config/jsmon` on Linux).
#[must_use]
pub fn user_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("jsmon"))
}

/// Find a config file in a specific directory.
fn find_config_in_dir(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|path| path.exists())
}

/// Find the git repository root by walking up the directory tree.
fn find_git_root() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

// ============================================================================
// Configuration File Loading
// ============================================================================

/// Error type for config file operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_yaml_ng::Error),
}

/// Load an `AppConfig` from a YAML file.
pub fn load_config_file(path: &Path) -> Result<AppConfig, ConfigFileError> {
    if !path.exists() {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml_ng::from_str(&content)?;
    Ok(config)
}

/// Load config from the discovered file, or return the default.
///
/// An explicit path that does not exist is an error; a discovered file that
/// fails to parse is an error too, since silently monitoring nothing is worse
/// than refusing to start.
pub fn load_or_default(
    explicit_path: Option<&Path>,
) -> Result<(AppConfig, Option<PathBuf>), ConfigFileError> {
    if let Some(path) = explicit_path
        && !path.exists()
    {
        return Err(ConfigFileError::NotFound(path.to_path_buf()));
    }

    match discover_config_file(explicit_path) {
        Some(path) => {
            let config = load_config_file(&path)?;
            tracing::debug!("Loaded config from {}", path.display());
            Ok((config, Some(path)))
        }
        None => Ok((AppConfig::default(), None)),
    }
}

// ============================================================================
// Configuration Merging
// ============================================================================

impl AppConfig {
    /// Add targets given on the command line after the configured ones.
    ///
    /// Duplicates are kept here; the version store collapses them by target id.
    pub fn merge_targets<I, S>(&mut self, urls: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets.extend(urls.into_iter().map(Into::into));
    }
}

// ============================================================================
// Example Config Generation
// ============================================================================

/// Generate a commented example config with all options.
#[must_use]
pub fn generate_example_config() -> String {
    r"# jsmon configuration
# Place this file at .jsmon.yaml in your project root or ~/.config/jsmon/jsmon.yaml
# CLI arguments always override file settings.

# JavaScript packages to monitor
targets:
  - https://code.jquery.com/jquery-3.7.1.min.js

storage:
  # SQLite version history (default: <data dir>/jsmon/jsmon.sqlite3)
  # database: /var/lib/jsmon/jsmon.sqlite3
  # Raw copies of every version, one file per digest (default: <data dir>/jsmon/raw)
  # blob_dir: /var/lib/jsmon/raw

fetch:
  timeout_secs: 30
  max_retries: 3
  # user_agent: jsmon

diff:
  # Characters of context shown around each change
  context_margin: 25
  # Changes this close together are reported as one
  merge_gap: 8
  timeout_ms: 5000

alerts:
  stderr: true
  # ndjson_file: /var/log/jsmon/alerts.ndjson
  # webhook_url: https://hooks.example.com/jsmon
  # email:
  #   smtp_host: smtp.example.com
  #   smtp_port: 25
  #   starttls: false
  #   username: jsmon
  #   password_env: JSMON_SMTP_PASSWORD
  #   from: jsmon@example.com
  #   to:
  #     - secops@example.com

watch:
  interval: 1h
  workers: 4
"
    .to_string()
}

// ============================================================================
// Tests
// ============================================================================
