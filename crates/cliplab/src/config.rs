//! Client configuration with environment overrides.

use std::time::Duration;

/// Default base URL of the remote job service.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Default interval between status polls while a job is processing.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Default connect timeout for HTTP requests.
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request timeout for HTTP requests. Uploads of large files can
/// take a while; this bounds the slowest accepted transfer.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Default cap on the rolling job history.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Configuration for a client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the remote job service, including the API prefix.
    pub base_url: String,
    /// Interval between status polls while a job is processing.
    pub poll_interval: Duration,
    /// Maximum number of jobs retained in the session history.
    pub history_limit: usize,
    /// HTTP connect timeout.
    pub connect_timeout: Duration,
    /// HTTP request timeout.
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            history_limit: DEFAULT_HISTORY_LIMIT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Creates a config with the given base URL and defaults elsewhere.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Builds a config from the environment, falling back to defaults.
    ///
    /// Recognized variables: `CLIPLAB_BASE_URL`,
    /// `CLIPLAB_POLL_INTERVAL_SECS`, `CLIPLAB_HISTORY_LIMIT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("CLIPLAB_BASE_URL") {
            if !url.trim().is_empty() {
                config.base_url = url.trim_end_matches('/').to_string();
            }
        }

        if let Ok(raw) = std::env::var("CLIPLAB_POLL_INTERVAL_SECS") {
            match raw.parse::<u64>() {
                Ok(secs) if secs > 0 => config.poll_interval = Duration::from_secs(secs),
                _ => log::warn!("Ignoring invalid CLIPLAB_POLL_INTERVAL_SECS: {}", raw),
            }
        }

        if let Ok(raw) = std::env::var("CLIPLAB_HISTORY_LIMIT") {
            match raw.parse::<usize>() {
                Ok(limit) if limit > 0 => config.history_limit = limit,
                _ => log::warn!("Ignoring invalid CLIPLAB_HISTORY_LIMIT: {}", raw),
            }
        }

        config
    }
}
