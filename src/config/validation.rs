//! Configuration validation.

use super::duration::parse_duration;
use super::types::{AlertsConfig, AppConfig, DiffConfig, EmailConfig, FetchConfig, WatchConfig};

// ============================================================================
// Configuration Error
// ============================================================================

/// Error type for configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The field that failed validation
    pub field: String,
    /// Description of the validation error
    pub message: String,
}

impl ConfigError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Validation Trait
// ============================================================================

/// Trait for validatable configuration types.
pub trait Validatable {
    /// Validate the configuration, returning any errors found.
    fn validate(&self) -> Vec<ConfigError>;

    /// Check if the configuration is valid.
    fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

// ============================================================================
// Validation Implementations
// ============================================================================

impl Validatable for AppConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        for (i, url) in self.targets.iter().enumerate() {
            if !is_http_url(url) {
                errors.push(ConfigError::new(
                    format!("targets[{i}]"),
                    format!("'{url}' is not an http(s) URL"),
                ));
            }
        }

        errors.extend(self.fetch.validate());
        errors.extend(self.diff.validate());
        errors.extend(self.alerts.validate());
        errors.extend(self.watch.validate());
        errors
    }
}

impl Validatable for FetchConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.timeout_secs == 0 {
            errors.push(ConfigError::new(
                "fetch.timeout_secs",
                "Timeout must be at least 1 second",
            ));
        }
        if self.max_retries > 10 {
            errors.push(ConfigError::new(
                "fetch.max_retries",
                format!("{} retries is excessive (max 10)", self.max_retries),
            ));
        }
        errors
    }
}

impl Validatable for DiffConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.timeout_ms == 0 {
            errors.push(ConfigError::new(
                "diff.timeout_ms",
                "Timeout must be greater than zero",
            ));
        }
        errors
    }
}

impl Validatable for AlertsConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if let Some(url) = &self.webhook_url
            && !is_http_url(url)
        {
            errors.push(ConfigError::new(
                "alerts.webhook_url",
                format!("'{url}' is not an http(s) URL"),
            ));
        }
        if let Some(email) = &self.email {
            errors.extend(email.validate());
        }
        errors
    }
}

impl Validatable for EmailConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        if self.smtp_host.trim().is_empty() {
            errors.push(ConfigError::new("alerts.email.smtp_host", "Host is empty"));
        }
        if self.smtp_port == 0 {
            errors.push(ConfigError::new("alerts.email.smtp_port", "Port must be non-zero"));
        }
        if !self.from.contains('@') {
            errors.push(ConfigError::new(
                "alerts.email.from",
                format!("'{}' is not an email address", self.from),
            ));
        }
        if self.to.is_empty() {
            errors.push(ConfigError::new(
                "alerts.email.to",
                "At least one recipient is required",
            ));
        }
        for (i, addr) in self.to.iter().enumerate() {
            if !addr.contains('@') {
                errors.push(ConfigError::new(
                    format!("alerts.email.to[{i}]"),
                    format!("'{addr}' is not an email address"),
                ));
            }
        }
        if self.password_env.is_some() && self.username.is_none() {
            errors.push(ConfigError::new(
                "alerts.email.username",
                "password_env is set but username is missing",
            ));
        }
        errors
    }
}

impl Validatable for WatchConfig {
    fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        match parse_duration(&self.interval) {
            Ok(d) if d.is_zero() => errors.push(ConfigError::new(
                "watch.interval",
                "Interval must be greater than zero",
            )),
            Ok(_) => {}
            Err(e) => errors.push(ConfigError::new("watch.interval", e.to_string())),
        }
        if self.workers == 0 {
            errors.push(ConfigError::new("watch.workers", "Need at least one worker"));
        }
        errors
    }
}

fn is_http_url(url: &str) -> bool {
    let rest = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"));
    rest.is_some_and(|r| !r.is_empty() && !r.starts_with('/'))
}
