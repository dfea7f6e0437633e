//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Upper bound on `retry.max_attempts`.
pub const MAX_ATTEMPTS_LIMIT: u32 = 10;

/// Upper bound on any single backoff delay, in seconds.
pub const MAX_BACKOFF_SECS: u64 = 300;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Places provider settings
    #[serde(default)]
    pub places: PlacesConfig,

    /// Fetch retry behavior
    #[serde(default)]
    pub retry: RetryConfig,

    /// Destination stream settings
    #[serde(default)]
    pub stream: StreamConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.stream.name.trim().is_empty() {
            return Err(AppError::validation("stream.name is empty (set STREAM_NAME)"));
        }
        if self.places.api_key.is_empty() {
            return Err(AppError::validation(
                "places API key is empty (set GOOGLE_API_KEY)",
            ));
        }
        if self.places.user_agent.trim().is_empty() {
            return Err(AppError::validation("places.user_agent is empty"));
        }
        if self.places.timeout_secs == 0 {
            return Err(AppError::validation("places.timeout_secs must be > 0"));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::validation("retry.max_attempts must be > 0"));
        }
        if self.retry.backoff_factor == 0 {
            return Err(AppError::validation("retry.backoff_factor must be > 0"));
        }
        if self.retry.max_attempts > MAX_ATTEMPTS_LIMIT {
            return Err(AppError::validation(format!(
                "retry.max_attempts must be <= {MAX_ATTEMPTS_LIMIT}"
            )));
        }
        // The longest sleep follows the second-to-last attempt.
        let longest_backoff = self
            .retry
            .backoff_factor
            .checked_pow(self.retry.max_attempts - 1);
        if !longest_backoff.is_some_and(|secs| secs <= MAX_BACKOFF_SECS) {
            return Err(AppError::validation(format!(
                "retry.backoff_factor {} with {} attempts exceeds the {MAX_BACKOFF_SECS}s backoff limit",
                self.retry.backoff_factor, self.retry.max_attempts
            )));
        }

        let endpoint = Url::parse(&self.places.endpoint)?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(AppError::validation(format!(
                "places.endpoint must be http(s), got '{}'",
                endpoint.scheme()
            )));
        }
        Ok(())
    }
}

/// Places text-search provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    /// Text-search endpoint
    #[serde(default = "defaults::endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Provider credential. Only ever taken from the environment.
    #[serde(skip)]
    pub api_key: ApiKey,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::endpoint(),
            timeout_secs: defaults::timeout(),
            user_agent: defaults::user_agent(),
            api_key: ApiKey::default(),
        }
    }
}

/// Retry settings for the fetch phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total fetch attempts, including the first
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Base of the exponential backoff, in seconds
    #[serde(default = "defaults::backoff_factor")]
    pub backoff_factor: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: defaults::max_attempts(),
            backoff_factor: defaults::backoff_factor(),
        }
    }
}

/// Destination stream settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Stream name
    #[serde(default)]
    pub name: String,
}

/// Places API key. Never shown by `Debug` or `Display`.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The raw key, for building the outbound request.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

mod defaults {
    pub fn endpoint() -> String {
        "https://maps.googleapis.com/maps/api/place/textsearch/json".into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn user_agent() -> String {
        concat!("places-poller/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn backoff_factor() -> u64 {
        2
    }
}
