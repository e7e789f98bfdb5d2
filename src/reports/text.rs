//! Plain-text alert report.
//!
//! This is the body reviewers receive by email, so the layout is fixed and
//! contains no timestamps: the same alert always renders to the same text.

use super::{ChangeAlert, ReportError, ReportFormat, ReportGenerator};
use crate::model::{PollOutcome, Snippet};
use std::fmt::Write as _;

const PREAMBLE: &str = "This is an alert from the JavaScript package monitor, which polls \
third-party JavaScript libraries served to public-facing websites.";

const GUIDANCE: &str = "The list below provides snippets of the original and changed text \
and should be reviewed for malicious indicators.\n\
Copies of the full files are retained by the monitor and can be provided for additional analysis.";

/// Render the report body for `snippets` of the package at `target_url`.
#[must_use]
pub fn format_report(target_url: &str, snippets: &[Snippet]) -> String {
    let total = snippets.len();
    let verb = if total == 1 { "change was" } else { "changes were" };
    let mut out = format!(
        "{PREAMBLE}\n{total} {verb} detected in the content of a package hosted at {target_url}\n\n{GUIDANCE}\n\n"
    );

    for snippet in snippets {
        out.push_str(&format!(
            "\n# Change {} of {total}\n\
             # OLD VERSION (CHARS {}-{}):    {}\n\
             # NEW VERSION (CHARS {}-{}):    {}\n",
            snippet.ordinal,
            snippet.old_window.start,
            snippet.old_window.end,
            snippet.old_text,
            snippet.new_window.start,
            snippet.new_window.end,
            snippet.new_text,
        ));
    }

    out
}

/// Text reporter for alert bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct TextReporter;

impl TextReporter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ReportGenerator for TextReporter {
    fn generate(&self, alert: &ChangeAlert) -> Result<String, ReportError> {
        let mut out = format_report(&alert.url, &alert.snippets);

        if let (Some(prev), Some(version)) = (alert.previous_version, alert.version) {
            writeln!(out)?;
            writeln!(out, "Version details:")?;
            writeln!(
                out,
                "  previous: version {prev} ({})",
                alert.old_digest.as_deref().unwrap_or("unknown digest")
            )?;
            writeln!(out, "  current:  version {version} ({})", alert.new_digest)?;
            if let PollOutcome::ReusedVersion { reverted_to } = alert.outcome {
                writeln!(
                    out,
                    "  note:     content is identical to previously seen version {reverted_to} (rollback)"
                )?;
            }
        }

        Ok(out)
    }

    fn format(&self) -> ReportFormat {
        ReportFormat::Text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snippet(ordinal: usize, old: &str, new: &str) -> Snippet {
        Snippet {
            ordinal,
            old_window: 0..old.chars().count(),
            new_window: 0..new.chars().count(),
            old_text: old.to_string(),
            new_text: new.to_string(),
        }
    }

    #[test]
    fn test_format_single_change() {
        let report = format_report(
            "https://cdn.example.com/app.js",
            &[snippet(1, "var x=1;", "var x=2;")],
        );
        assert!(report.starts_with(PREAMBLE));
        assert!(report.contains(
            "1 change was detected in the content of a package hosted at https://cdn.example.com/app.js"
        ));
        assert!(report.contains("# Change 1 of 1\n"));
        assert!(report.contains("# OLD VERSION (CHARS 0-8):    var x=1;\n"));
        assert!(report.contains("# NEW VERSION (CHARS 0-8):    var x=2;\n"));
    }

    #[test]
    fn test_format_counts_and_orders_changes() {
        let report = format_report(
            "https://cdn.example.com/app.js",
            &[snippet(1, "a", "b"), snippet(2, "c", "d")],
        );
        assert!(report.contains("2 changes were detected"));
        let first = report.find("# Change 1 of 2").unwrap();
        let second = report.find("# Change 2 of 2").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_format_is_deterministic() {
        let snippets = [snippet(1, "var x=1;", "var x=2;")];
        assert_eq!(
            format_report("https://a.example/x.js", &snippets),
            format_report("https://a.example/x.js", &snippets)
        );
    }

    #[test]
    fn test_format_with_no_snippets() {
        let report = format_report("https://a.example/x.js", &[]);
        assert!(report.contains("0 changes were detected"));
        assert!(!report.contains("# Change"));
    }

    #[test]
    fn test_format_exact_layout() {
        let report = format_report("https://a.example/x.js", &[snippet(1, "var x=1;", "var x=2;")]);
        let expected = format!(
            "{PREAMBLE}\n\
             1 change was detected in the content of a package hosted at https://a.example/x.js\n\
             \n\
             {GUIDANCE}\n\
             \n\
             \n\
             # Change 1 of 1\n\
             # OLD VERSION (CHARS 0-8):    var x=1;\n\
             # NEW VERSION (CHARS 0-8):    var x=2;\n"
        );
        assert_eq!(report, expected);
    }
}
