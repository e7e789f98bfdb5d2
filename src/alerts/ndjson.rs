use super::AlertSink;
use crate::monitor::CycleSummary;
use crate::reports::ChangeAlert;
use std::io::Write;

/// Writes one JSON object per event.
pub struct NdjsonAlertSink {
    writer: Box<dyn Write + Send>,
}

impl NdjsonAlertSink {
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self { writer }
    }

    fn write_event(&mut self, event: &serde_json::Value) -> anyhow::Result<()> {
        serde_json::to_writer(&mut self.writer, event)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

impl AlertSink for NdjsonAlertSink {
    fn name(&self) -> &str {
        "ndjson"
    }

    fn deliver(&mut self, alert: &ChangeAlert, report: &str) -> anyhow::Result<()> {
        let event = serde_json::json!({
            "type": "change",
            "alert": alert,
            "report": report,
        });
        self.write_event(&event)
    }

    fn on_cycle(&mut self, summary: &CycleSummary) -> anyhow::Result<()> {
        let event = serde_json::json!({
            "type": "cycle",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "summary": summary,
        });
        self.write_event(&event)
    }
}
