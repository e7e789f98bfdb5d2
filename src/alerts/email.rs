use super::AlertSink;
use crate::config::EmailConfig;
use crate::reports::ChangeAlert;
use anyhow::Context;
use lettre::message::{Mailbox, Message, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{SmtpTransport, Transport};

pub const EMAIL_SUBJECT: &str = "Monitored Js Package has been modified";

/// Sends the text report to a fixed recipient list over SMTP.
pub struct EmailAlertSink {
    mailer: SmtpTransport,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl EmailAlertSink {
    pub fn new(config: &EmailConfig) -> anyhow::Result<Self> {
        let builder = if config.starttls {
            SmtpTransport::starttls_relay(&config.smtp_host)
                .with_context(|| format!("invalid SMTP host {}", config.smtp_host))?
        } else {
            SmtpTransport::builder_dangerous(config.smtp_host.as_str())
        };
        let mut builder = builder.port(config.smtp_port);

        if let Some(user) = &config.username {
            let password = match &config.password_env {
                Some(var) => std::env::var(var)
                    .with_context(|| format!("reading SMTP password from ${var}"))?,
                None => String::new(),
            };
            builder = builder.credentials(Credentials::new(user.clone(), password));
        }

        let from = config
            .from
            .parse::<Mailbox>()
            .with_context(|| format!("invalid sender {}", config.from))?;
        let to = config
            .to
            .iter()
            .map(|addr| {
                addr.parse::<Mailbox>()
                    .with_context(|| format!("invalid recipient {addr}"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        anyhow::ensure!(!to.is_empty(), "email alerts need at least one recipient");

        Ok(Self {
            mailer: builder.build(),
            from,
            to,
        })
    }

    /// Compose the alert message without sending it.
    pub fn compose(&self, report: &str) -> anyhow::Result<Message> {
        let mut builder = Message::builder()
            .from(self.from.clone())
            .subject(EMAIL_SUBJECT)
            .header(header::ContentType::TEXT_PLAIN);
        for rcpt in &self.to {
            builder = builder.to(rcpt.clone());
        }
        builder.body(report.to_string()).context("build email")
    }
}

impl AlertSink for EmailAlertSink {
    fn name(&self) -> &str {
        "email"
    }

    fn deliver(&mut self, alert: &ChangeAlert, report: &str) -> anyhow::Result<()> {
        let message = self.compose(report)?;
        self.mailer
            .send(&message)
            .with_context(|| format!("sending alert for {}", alert.url))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            from: "jsmon@example.com".to_string(),
            to: vec![
                "secops@example.com".to_string(),
                "Web Team <web@example.com>".to_string(),
            ],
            ..EmailConfig::default()
        }
    }

    #[test]
    fn test_compose_sets_subject_and_recipients() {
        let sink = EmailAlertSink::new(&config()).unwrap();
        let message = sink.compose("1 change was detected").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Monitored Js Package has been modified"));
        assert!(raw.contains("secops@example.com"));
        assert!(raw.contains("web@example.com"));
        assert!(raw.contains("1 change was detected"));
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let mut cfg = config();
        cfg.to = vec!["not an address".to_string()];
        assert!(EmailAlertSink::new(&cfg).is_err());
    }

    #[test]
    fn test_missing_password_variable_rejected() {
        let mut cfg = config();
        cfg.username = Some("jsmon".to_string());
        cfg.password_env = Some("JSMON_TEST_PASSWORD_THAT_IS_NEVER_SET".to_string());
        assert!(EmailAlertSink::new(&cfg).is_err());
    }
}
