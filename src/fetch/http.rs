//! Blocking HTTP fetcher with retries.

use super::{Fetcher, backoff_delay};
use crate::config::FetchConfig;
use crate::error::{FetchErrorKind, MonitorError, Result};
use reqwest::blocking::Client;
use std::time::Duration;

const DEFAULT_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP fetcher configuration.
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Request timeout
    pub timeout: Duration,
    /// Maximum retries for failed requests
    pub max_retries: u8,
    /// First retry delay; doubles on every further retry
    pub backoff_base: Duration,
    pub user_agent: String,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(crate::config::DEFAULT_FETCH_TIMEOUT_SECS),
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_secs(1),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl From<&FetchConfig> for HttpFetcherConfig {
    fn from(config: &FetchConfig) -> Self {
        Self {
            timeout: config.timeout(),
            max_retries: config.max_retries,
            user_agent: config
                .user_agent
                .clone()
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
            ..Self::default()
        }
    }
}

/// Fetches targets over HTTP(S).
pub struct HttpFetcher {
    client: Client,
    config: HttpFetcherConfig,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| {
                MonitorError::fetch("<client>", FetchErrorKind::Network(e.to_string()))
            })?;

        Ok(Self { client, config })
    }

    fn fetch_once(&self, url: &str) -> std::result::Result<Vec<u8>, FetchErrorKind> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| FetchErrorKind::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchErrorKind::Status(status.as_u16()));
        }

        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| FetchErrorKind::Network(e.to_string()))
    }
}

/// Client errors other than throttling will not fix themselves on retry.
const fn is_retryable(kind: &FetchErrorKind) -> bool {
    match kind {
        FetchErrorKind::Status(code) => *code == 429 || *code >= 500,
        FetchErrorKind::Network(_) => true,
        _ => false,
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut attempt: u8 = 0;
        loop {
            if attempt > 0 {
                let delay = backoff_delay(self.config.backoff_base, attempt);
                tracing::debug!("Retry {attempt} for {url} after {delay:?}");
                std::thread::sleep(delay);
            }

            match self.fetch_once(url) {
                Ok(body) => return Ok(body),
                Err(kind) if !is_retryable(&kind) => return Err(MonitorError::fetch(url, kind)),
                Err(kind) if attempt >= self.config.max_retries => {
                    return Err(MonitorError::fetch(
                        url,
                        FetchErrorKind::RetriesExhausted {
                            attempts: attempt.saturating_add(1),
                            last: kind.to_string(),
                        },
                    ));
                }
                Err(kind) => {
                    tracing::debug!("Fetch attempt {} for {url} failed: {kind}", attempt + 1);
                    attempt += 1;
                }
            }
        }
    }
}
