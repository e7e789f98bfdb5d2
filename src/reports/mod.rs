//! Report generation for change alerts.
//!
//! - Text: the human-readable body sent to reviewers (see [`format_report`])
//! - JSON: structured alert for NDJSON streams and webhooks

mod alert;
mod json;
mod text;
mod types;

pub use alert::ChangeAlert;
pub use json::JsonReporter;
pub use text::{TextReporter, format_report};
pub use types::ReportFormat;

use std::io::Write;
use thiserror::Error;

/// Errors that can occur during report generation
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Format error: {0}")]
    FormatError(#[from] std::fmt::Error),
}

/// Trait for report generators
pub trait ReportGenerator {
    /// Render an alert
    fn generate(&self, alert: &ChangeAlert) -> Result<String, ReportError>;

    /// Write the rendered alert to a writer
    fn write_report(&self, alert: &ChangeAlert, writer: &mut dyn Write) -> Result<(), ReportError> {
        let report = self.generate(alert)?;
        writer.write_all(report.as_bytes())?;
        Ok(())
    }

    /// Get the format this generator produces
    fn format(&self) -> ReportFormat;
}

/// Create a report generator for a format.
#[must_use]
pub fn create_reporter(format: ReportFormat) -> Box<dyn ReportGenerator> {
    match format {
        ReportFormat::Text => Box::new(TextReporter::new()),
        ReportFormat::Json => Box::new(JsonReporter::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PollOutcome, Snippet, TargetId};
    use chrono::Utc;

    fn alert(outcome: PollOutcome) -> ChangeAlert {
        ChangeAlert {
            url: "https://cdn.example.com/app.js".to_string(),
            target_id: TargetId::for_url("https://cdn.example.com/app.js"),
            outcome,
            previous_version: Some(2),
            version: Some(3),
            old_digest: Some("bbb".to_string()),
            new_digest: "aaa".to_string(),
            detected_at: Utc::now(),
            snippets: vec![Snippet {
                ordinal: 1,
                old_window: 0..8,
                new_window: 0..8,
                old_text: "var x=2;".to_string(),
                new_text: "var x=1;".to_string(),
            }],
        }
    }

    #[test]
    fn test_text_report_mentions_rollback() {
        let text = TextReporter::new()
            .generate(&alert(PollOutcome::ReusedVersion { reverted_to: 1 }))
            .unwrap();
        assert!(text.contains("previous: version 2 (bbb)"));
        assert!(text.contains("current:  version 3 (aaa)"));
        assert!(text.contains("previously seen version 1 (rollback)"));
    }

    #[test]
    fn test_text_report_omits_timestamp() {
        let a = alert(PollOutcome::NewVersion);
        let mut b = a.clone();
        b.detected_at = a.detected_at + chrono::Duration::hours(3);
        let reporter = TextReporter::new();
        assert_eq!(reporter.generate(&a).unwrap(), reporter.generate(&b).unwrap());
    }

    #[test]
    fn test_json_report_is_structured() {
        let json = JsonReporter::new()
            .pretty(false)
            .generate(&alert(PollOutcome::NewVersion))
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["outcome"]["kind"], "new_version");
        assert_eq!(value["version"], 3);
        assert_eq!(value["snippets"][0]["old_text"], "var x=2;");
        assert_eq!(value["snippets"][0]["old_window"]["start"], 0);
    }

    #[test]
    fn test_create_reporter_matches_format() {
        assert_eq!(create_reporter(ReportFormat::Json).format(), ReportFormat::Json);
        assert_eq!(create_reporter(ReportFormat::Text).format(), ReportFormat::Text);
    }
}
