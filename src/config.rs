// src/config.rs

//! Configuration loading utilities.
//!
//! Configuration is resolved once at start-up and handed to the poller:
//! built-in defaults < config file (optional) < environment.
//!
//! ## Environment Variables
//!
//! - `STREAM_NAME`: destination stream (required)
//! - `GOOGLE_API_KEY`: places provider credential (required)
//! - `PLACES_TIMEOUT_SECS`: HTTP request timeout
//! - `PLACES_MAX_ATTEMPTS`: fetch attempts before giving up
//! - `PLACES_BACKOFF_FACTOR`: base of the exponential backoff

use std::path::Path;
use std::str::FromStr;

use crate::error::{AppError, Result};
use crate::models::{ApiKey, Config};

pub const ENV_STREAM_NAME: &str = "STREAM_NAME";
pub const ENV_API_KEY: &str = "GOOGLE_API_KEY";
pub const ENV_TIMEOUT_SECS: &str = "PLACES_TIMEOUT_SECS";
pub const ENV_MAX_ATTEMPTS: &str = "PLACES_MAX_ATTEMPTS";
pub const ENV_BACKOFF_FACTOR: &str = "PLACES_BACKOFF_FACTOR";

impl Config {
    /// Build configuration from defaults and the process environment.
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();
        config.apply_env(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Apply environment overrides using the given variable lookup.
    ///
    /// `STREAM_NAME` and `GOOGLE_API_KEY` are required unless the stream
    /// name already came from a config file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        match lookup(ENV_STREAM_NAME).filter(|v| !v.trim().is_empty()) {
            Some(name) => self.stream.name = name,
            None if self.stream.name.trim().is_empty() => {
                return Err(AppError::config(format!(
                    "{ENV_STREAM_NAME} is not set"
                )));
            }
            None => {}
        }

        let key = lookup(ENV_API_KEY)
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AppError::config(format!("{ENV_API_KEY} is not set")))?;
        self.places.api_key = ApiKey::new(key);

        if let Some(secs) = parse_override(&lookup, ENV_TIMEOUT_SECS) {
            self.places.timeout_secs = secs;
        }
        if let Some(attempts) = parse_override(&lookup, ENV_MAX_ATTEMPTS) {
            self.retry.max_attempts = attempts;
        }
        if let Some(factor) = parse_override(&lookup, ENV_BACKOFF_FACTOR) {
            self.retry.backoff_factor = factor;
        }

        Ok(())
    }
}

/// Parse an optional numeric override, ignoring values that don't parse.
fn parse_override<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {name}={raw:?}: not a valid number");
            None
        }
    }
}

/// Load configuration from a TOML file, then apply the environment.
///
/// Falls back to defaults if the file cannot be loaded.
pub fn load_config(path: &Path) -> Result<Config> {
    let mut config = if path.exists() {
        Config::load_or_default(path)
    } else {
        log::debug!("No config file at {path:?}, using defaults");
        Config::default()
    };
    config.apply_env(|name| std::env::var(name).ok())?;
    Ok(config)
}
