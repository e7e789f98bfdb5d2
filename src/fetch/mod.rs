//! Retrieval of monitored content.

#[cfg(feature = "http")]
mod http;

#[cfg(feature = "http")]
pub use http::{HttpFetcher, HttpFetcherConfig};

use crate::config::FetchConfig;
use crate::error::{FetchErrorKind, MonitorError, Result};
use std::time::Duration;

/// Source of raw bytes for a target URL.
pub trait Fetcher: Send + Sync {
    /// Fetch the current content served at `url`.
    fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Delay before retry number `attempt` (1-based): 1s, 2s, 4s, ...
#[must_use]
pub fn backoff_delay(base: Duration, attempt: u8) -> Duration {
    let exp = u32::from(attempt.saturating_sub(1)).min(16);
    base.saturating_mul(1 << exp)
}

/// Build the fetcher for the configured transport.
pub fn build_fetcher(config: &FetchConfig) -> Result<Box<dyn Fetcher>> {
    #[cfg(feature = "http")]
    {
        let fetcher = HttpFetcher::new(HttpFetcherConfig::from(config))?;
        Ok(Box::new(fetcher))
    }
    #[cfg(not(feature = "http"))]
    {
        let _ = config;
        Ok(Box::new(UnsupportedFetcher))
    }
}

/// Fails every fetch; used when the crate is built without HTTP support.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedFetcher;

impl Fetcher for UnsupportedFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Err(MonitorError::fetch(url, FetchErrorKind::Unsupported))
    }
}
