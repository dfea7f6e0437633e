// src/models/mod.rs

//! Domain models for the poller.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod invocation;
mod place;

// Re-export all public types
pub use config::{ApiKey, Config, PlacesConfig, RetryConfig, StreamConfig};
pub use invocation::{InvocationResult, RETRIES_EXHAUSTED_MESSAGE, UNEXPECTED_ERROR_MESSAGE};
pub use place::{PlaceRecord, TextSearchResponse};
