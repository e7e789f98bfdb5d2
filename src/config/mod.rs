//! Configuration for jsmon.
//!
//! - Typed sections with defaults ([`AppConfig`])
//! - Validation ([`Validatable`])
//! - YAML config file loading and discovery ([`file`])
//!
//! # Configuration File
//!
//! Place a `.jsmon.yaml` file in your project root or `~/.config/jsmon/`:
//!
//! ```yaml
//! targets:
//!   - https://cdn.example.com/widget.js
//! watch:
//!   interval: 30m
//! alerts:
//!   email:
//!     smtp_host: smtp.example.com
//!     from: jsmon@example.com
//!     to: [secops@example.com]
//! ```

mod defaults;
mod duration;
pub mod file;
mod types;
mod validation;

pub use defaults::{
    DEFAULT_FETCH_TIMEOUT_SECS, DEFAULT_MAX_RETRIES, DEFAULT_WATCH_INTERVAL, DEFAULT_WORKERS,
    data_dir, default_blob_dir, default_database_path,
};
pub use duration::{InvalidDuration, parse_duration};
pub use types::{
    AlertsConfig, AppConfig, AppConfigBuilder, DiffConfig, EmailConfig, FetchConfig,
    StorageConfig, WatchConfig,
};
pub use validation::{ConfigError, Validatable};

pub use file::{
    ConfigFileError, discover_config_file, generate_example_config, load_config_file,
    load_or_default,
};

/// Generate a JSON Schema for the `AppConfig` configuration format.
///
/// Editors can use it to validate and autocomplete `.jsmon.yaml` files.
pub fn generate_json_schema() -> Result<String, serde_json::Error> {
    let schema = schemars::schema_for!(AppConfig);
    serde_json::to_string_pretty(&schema)
}
