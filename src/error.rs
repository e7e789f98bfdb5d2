//! Unified error types for jsmon.
//!
//! The taxonomy mirrors how each failure is recovered from during a poll
//! cycle: fetch failures skip the target until the next cycle, store failures
//! abort the target's classification, precondition failures are integration
//! bugs, and delivery failures are logged without touching recorded versions.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for jsmon operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum MonitorError {
    /// Network or remote failure while retrieving a target's content
    #[error("Failed to fetch {url}")]
    Fetch {
        url: String,
        #[source]
        source: FetchErrorKind,
    },

    /// Failure of the underlying persistence layer
    #[error("Version store failure: {context}")]
    Store {
        context: String,
        #[source]
        source: StoreErrorKind,
    },

    /// Caller contract violation (unregistered target, missing blob)
    #[error("Precondition violated: {0}")]
    Precondition(String),

    /// Alert transport failure
    #[error("Alert delivery via {sink} failed: {message}")]
    Delivery { sink: String, message: String },

    /// IO errors with context
    #[error("IO error at {path:?}: {message}")]
    Io {
        path: Option<PathBuf>,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Configuration errors
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An alert report could not be rendered
    #[error("Report rendering failed: {0}")]
    Report(String),
}

/// Specific fetch error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum FetchErrorKind {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Remote returned status {0}")]
    Status(u16),

    #[error("Gave up after {attempts} attempt(s): {last}")]
    RetriesExhausted { attempts: u8, last: String },

    #[error("No HTTP support compiled in")]
    Unsupported,
}

/// Specific store error kinds
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum StoreErrorKind {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt row: {0}")]
    CorruptRow(String),

    #[error("Lock poisoned")]
    Poisoned,

    #[error("Blob store error: {0}")]
    Blob(String),
}

// ============================================================================
// Result type alias
// ============================================================================

/// Convenient Result type for jsmon operations
pub type Result<T> = std::result::Result<T, MonitorError>;

// ============================================================================
// Error construction helpers
// ============================================================================

impl MonitorError {
    /// Create a fetch error for a URL
    pub fn fetch(url: impl Into<String>, source: FetchErrorKind) -> Self {
        Self::Fetch {
            url: url.into(),
            source,
        }
    }

    /// Create a store error with context
    pub fn store(context: impl Into<String>, source: StoreErrorKind) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    /// Create a precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Create a delivery error for a named sink
    pub fn delivery(sink: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Delivery {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create an IO error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let message = format!("{source}");
        Self::Io {
            path: Some(path.into()),
            message,
            source,
        }
    }

    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a report rendering error
    pub fn report(message: impl Into<String>) -> Self {
        Self::Report(message.into())
    }

    /// Whether the failure only affects the current cycle and should be retried
    /// on the next one.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Delivery { .. })
    }
}

// ============================================================================
// Conversions from existing error types
// ============================================================================

impl From<std::io::Error> for MonitorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            path: None,
            message: format!("{err}"),
            source: err,
        }
    }
}

impl From<rusqlite::Error> for MonitorError {
    fn from(err: rusqlite::Error) -> Self {
        Self::store("sqlite", StoreErrorKind::Database(err.to_string()))
    }
}

impl From<serde_json::Error> for MonitorError {
    fn from(err: serde_json::Error) -> Self {
        Self::config(format!("JSON serialization: {err}"))
    }
}

// ============================================================================
// Error context extension trait
// ============================================================================

/// Extension trait for adding context to errors.
///
/// Context strings are prepended to the error's existing context, so a chain
/// like `"classify: sqlite"` shows the path through the code.
///
/// ```ignore
/// use jsmon::error::ErrorContext;
///
/// let history = store
///     .history(&target.target_id)
///     .with_context(|| format!("loading history for {}", target.url))?;
/// ```
pub trait ErrorContext<T> {
    /// Add context to an error.
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context from a closure, only evaluated on error.
    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T, E: Into<MonitorError>> ErrorContext<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        let ctx: String = context.into();
        self.map_err(|e| add_context_to_error(e.into(), &ctx))
    }

    fn with_context<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.map_err(|e| {
            let ctx: String = f().into();
            add_context_to_error(e.into(), &ctx)
        })
    }
}

/// Add context to an error, chaining with any existing context.
///
/// Fetch and delivery errors already name their URL or sink and pass through.
fn add_context_to_error(err: MonitorError, new_ctx: &str) -> MonitorError {
    match err {
        MonitorError::Store {
            context: existing,
            source,
        } => MonitorError::Store {
            context: chain_context(new_ctx, &existing),
            source,
        },
        MonitorError::Io {
            path,
            message,
            source,
        } => MonitorError::Io {
            path,
            message: chain_context(new_ctx, &message),
            source,
        },
        MonitorError::Precondition(msg) => {
            MonitorError::Precondition(chain_context(new_ctx, &msg))
        }
        MonitorError::Config(msg) => MonitorError::Config(chain_context(new_ctx, &msg)),
        MonitorError::Report(msg) => MonitorError::Report(chain_context(new_ctx, &msg)),
        other @ (MonitorError::Fetch { .. } | MonitorError::Delivery { .. }) => other,
    }
}

/// Chain two context strings together.
///
/// If the existing context is empty, returns just the new context.
/// Otherwise, returns "`new_context`: `existing_context`".
fn chain_context(new: &str, existing: &str) -> String {
    if existing.is_empty() {
        new.to_string()
    } else {
        format!("{new}: {existing}")
    }
}

/// Extension trait for Option types to convert to errors with context.
pub trait OptionContext<T> {
    /// Convert None to a precondition error with the given context.
    fn context_none(self, context: impl Into<String>) -> Result<T>;

    /// Convert None to a precondition error with context from a closure.
    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>;
}

impl<T> OptionContext<T> for Option<T> {
    fn context_none(self, context: impl Into<String>) -> Result<T> {
        self.ok_or_else(|| MonitorError::Precondition(context.into()))
    }

    fn with_context_none<F, C>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Into<String>,
    {
        self.ok_or_else(|| MonitorError::Precondition(f().into()))
    }
}
