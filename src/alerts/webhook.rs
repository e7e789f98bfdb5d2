use super::AlertSink;
use crate::reports::ChangeAlert;
use anyhow::Context;
use std::time::Duration;

/// POSTs each alert as JSON.
pub struct WebhookAlertSink {
    url: String,
    client: reqwest::blocking::Client,
}

impl WebhookAlertSink {
    pub fn new(url: String) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("building webhook client")?;
        Ok(Self { url, client })
    }
}

impl AlertSink for WebhookAlertSink {
    fn name(&self) -> &str {
        "webhook"
    }

    fn deliver(&mut self, alert: &ChangeAlert, report: &str) -> anyhow::Result<()> {
        let payload = serde_json::json!({
            "type": "change",
            "alert": alert,
            "report": report,
        });
        let response = self
            .client
            .post(&self.url)
            .json(&payload)
            .send()
            .with_context(|| format!("POST {}", self.url))?;

        let status = response.status();
        anyhow::ensure!(status.is_success(), "webhook returned status {status}");
        Ok(())
    }
}
