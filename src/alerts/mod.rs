//! Alert sinks.
//!
//! Every change alert is delivered to each configured sink: stderr
//! (human-readable report), NDJSON (machine-readable), webhook (HTTP POST,
//! feature `http`) and email (SMTP, feature `email`).

#[cfg(feature = "email")]
mod email;
mod ndjson;
mod stderr;
#[cfg(feature = "http")]
mod webhook;

#[cfg(feature = "email")]
pub use email::{EMAIL_SUBJECT, EmailAlertSink};
pub use ndjson::NdjsonAlertSink;
pub use stderr::StderrAlertSink;
#[cfg(feature = "http")]
pub use webhook::WebhookAlertSink;

use crate::config::AlertsConfig;
use crate::monitor::CycleSummary;
use crate::reports::ChangeAlert;
use std::io::Write;

/// Receiver of monitor events.
pub trait AlertSink: Send {
    /// Short name used in logs and delivery errors.
    fn name(&self) -> &str;

    /// Deliver one change alert. `report` is the rendered text body.
    fn deliver(&mut self, alert: &ChangeAlert, report: &str) -> anyhow::Result<()>;

    /// Called after every poll cycle.
    fn on_cycle(&mut self, _summary: &CycleSummary) -> anyhow::Result<()> {
        Ok(())
    }
}

// ============================================================================
// Sink builder
// ============================================================================

/// Build alert sinks from the alerts configuration.
pub fn build_alert_sinks(
    config: &AlertsConfig,
    quiet: bool,
) -> anyhow::Result<Vec<Box<dyn AlertSink>>> {
    let mut sinks: Vec<Box<dyn AlertSink>> = Vec::new();

    if config.stderr {
        sinks.push(Box::new(StderrAlertSink::new(quiet)));
    }

    if let Some(path) = &config.ndjson_file {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        let writer: Box<dyn Write + Send> = Box::new(file);
        sinks.push(Box::new(NdjsonAlertSink::new(writer)));
    }

    if let Some(url) = &config.webhook_url {
        #[cfg(feature = "http")]
        sinks.push(Box::new(WebhookAlertSink::new(url.clone())?));
        #[cfg(not(feature = "http"))]
        tracing::warn!("Ignoring webhook {url}: built without the `http` feature");
    }

    if let Some(email) = &config.email {
        #[cfg(feature = "email")]
        sinks.push(Box::new(EmailAlertSink::new(email)?));
        #[cfg(not(feature = "email"))]
        tracing::warn!(
            "Ignoring email alerts to {:?}: built without the `email` feature",
            email.to
        );
    }

    if sinks.is_empty() {
        tracing::warn!("No alert sinks configured; changes will only be logged");
    }

    Ok(sinks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds_stderr_sink() {
        let sinks = build_alert_sinks(&AlertsConfig::default(), true).unwrap();
        let names: Vec<_> = sinks.iter().map(|s| s.name().to_string()).collect();
        assert_eq!(names, vec!["stderr"]);
    }

    #[test]
    fn test_ndjson_file_sink_creates_parent() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("logs").join("alerts.ndjson");
        let config = AlertsConfig {
            stderr: false,
            ndjson_file: Some(path.clone()),
            ..AlertsConfig::default()
        };
        let sinks = build_alert_sinks(&config, true).unwrap();
        assert_eq!(sinks.len(), 1);
        assert_eq!(sinks[0].name(), "ndjson");
        assert!(path.exists());
    }
}
