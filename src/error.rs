// src/error.rs

//! Unified error handling for the poller.

use std::fmt;

use thiserror::Error;

/// Result type alias for poller operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider answered with a non-2xx status
    #[error("HTTP status {status} from places provider")]
    Status { status: u16 },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Provider payload did not have the expected shape
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Stream publish failed
    #[error("Publish to stream '{stream}' failed: {message}")]
    Publish { stream: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A task panicked instead of returning an error
    #[error("Task panicked: {0}")]
    Panicked(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }

    /// Create a publish error for a stream.
    pub fn publish(stream: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Publish {
            stream: stream.into(),
            message: message.to_string(),
        }
    }

    /// Whether a fetch that failed with this error may succeed on retry.
    ///
    /// Only transport-level failures and HTTP error statuses qualify.
    /// Everything else is treated as unexpected.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}
