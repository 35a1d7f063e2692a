//! Sync client configuration.
//!
//! Loaded from a TOML file, every key optional:
//!
//! ```toml
//! states_url = "http://localhost:8027/states"
//! poll_delay_ms = 100
//! unchanged_etag_backoff_ms = 2000
//! poll_timeout_secs = 120
//! max_poll_timeouts = 3
//! ```
//!
//! `BLACKHOLE_STATES_URL` and `BLACKHOLE_POLL_TIMEOUT_SECS` override the file.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding `states_url`
pub const ENV_STATES_URL: &str = "BLACKHOLE_STATES_URL";

/// Environment variable overriding `poll_timeout_secs`
pub const ENV_POLL_TIMEOUT_SECS: &str = "BLACKHOLE_POLL_TIMEOUT_SECS";

/// Sync client settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SyncConfig {
    /// Collection URL of the state store (default: http://localhost:8027/states).
    #[serde(default = "default_states_url")]
    pub states_url: String,
    /// Pause after a poll that brought a new state (default: 100 ms).
    #[serde(default = "default_poll_delay_ms")]
    pub poll_delay_ms: u64,
    /// Pause after a 200 carrying the ETag we already had (default: 2000 ms).
    /// Happens when the server ignores `If-None-Match`.
    #[serde(default = "default_unchanged_etag_backoff_ms")]
    pub unchanged_etag_backoff_ms: u64,
    /// Client-side limit for one request, long-polls included (default: 120).
    /// 0 disables the limit.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Consecutive poll timeouts after which polling fails (default: 3).
    #[serde(default = "default_max_poll_timeouts")]
    pub max_poll_timeouts: u32,
}

fn default_states_url() -> String {
    "http://localhost:8027/states".to_string()
}

fn default_poll_delay_ms() -> u64 {
    100
}

fn default_unchanged_etag_backoff_ms() -> u64 {
    2000
}

fn default_poll_timeout_secs() -> u64 {
    120 // longer than the server's 100 s hold
}

fn default_max_poll_timeouts() -> u32 {
    3
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            states_url: default_states_url(),
            poll_delay_ms: default_poll_delay_ms(),
            unchanged_etag_backoff_ms: default_unchanged_etag_backoff_ms(),
            poll_timeout_secs: default_poll_timeout_secs(),
            max_poll_timeouts: default_max_poll_timeouts(),
        }
    }
}

impl SyncConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply overrides from the process environment.
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from any variable lookup.
    pub fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(ENV_STATES_URL) {
            self.states_url = url;
        }
        if let Some(value) = lookup(ENV_POLL_TIMEOUT_SECS) {
            self.poll_timeout_secs =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnvironment {
                        name: ENV_POLL_TIMEOUT_SECS,
                        value,
                    })?;
        }
        Ok(self)
    }

    pub fn with_states_url(mut self, states_url: impl Into<String>) -> Self {
        self.states_url = states_url.into();
        self
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_unchanged_etag_backoff(mut self, backoff: Duration) -> Self {
        self.unchanged_etag_backoff_ms = backoff.as_millis() as u64;
        self
    }

    /// Set the request timeout; `None` waits forever.
    pub fn with_poll_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.poll_timeout_secs = timeout.map_or(0, |t| t.as_secs().max(1));
        self
    }

    pub fn with_max_poll_timeouts(mut self, max: u32) -> Self {
        self.max_poll_timeouts = max;
        self
    }

    pub fn poll_delay(&self) -> Duration {
        Duration::from_millis(self.poll_delay_ms)
    }

    pub fn unchanged_etag_backoff(&self) -> Duration {
        Duration::from_millis(self.unchanged_etag_backoff_ms)
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        (self.poll_timeout_secs > 0).then(|| Duration::from_secs(self.poll_timeout_secs))
    }

    /// Site root the join links point at: `states_url` minus its last segment.
    pub fn base_url(&self) -> &str {
        let trimmed = self.states_url.trim_end_matches('/');
        trimmed.rsplit_once('/').map_or(trimmed, |(base, _)| base)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to parse inline configuration.
    #[error("failed to parse config: {0}")]
    Invalid(#[from] toml::de::Error),
    /// An environment override has an unusable value.
    #[error("invalid value {value:?} for {name}")]
    InvalidEnvironment { name: &'static str, value: String },
}
