use super::AlertSink;
use crate::monitor::CycleSummary;
use crate::reports::ChangeAlert;
use std::io::Write;

/// Prints full alert reports and cycle summaries to stderr.
pub struct StderrAlertSink {
    quiet: bool,
    writer: Box<dyn Write + Send>,
}

impl StderrAlertSink {
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self::with_writer(quiet, Box::new(std::io::stderr()))
    }

    /// Write to `writer` instead of stderr.
    #[must_use]
    pub fn with_writer(quiet: bool, writer: Box<dyn Write + Send>) -> Self {
        Self { quiet, writer }
    }
}

impl AlertSink for StderrAlertSink {
    fn name(&self) -> &str {
        "stderr"
    }

    fn deliver(&mut self, alert: &ChangeAlert, report: &str) -> anyhow::Result<()> {
        let ts = alert.detected_at.with_timezone(&chrono::Local).format("%H:%M:%S");
        writeln!(self.writer, "[{ts}] {} ({})", alert.url, alert.outcome)?;
        writeln!(self.writer, "{report}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn on_cycle(&mut self, summary: &CycleSummary) -> anyhow::Result<()> {
        if self.quiet {
            return Ok(());
        }
        let ts = chrono::Local::now().format("%H:%M:%S");
        writeln!(
            self.writer,
            "[{ts}] Polled {} targets | {} changed | {} new | {} failed | {} unalerted | {}ms",
            summary.targets,
            summary.changes,
            summary.first_sightings,
            summary.failures,
            summary.alert_failures,
            summary.elapsed_ms,
        )?;
        Ok(())
    }
}
