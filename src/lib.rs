// src/lib.rs

//! Places poller library
//!
//! Fetches one page of Google Places text-search results and republishes
//! each record onto a stream.

pub mod config;
pub mod error;
#[cfg(feature = "lambda")]
pub mod lambda;
pub mod models;
pub mod publisher;
pub mod services;
pub mod utils;
