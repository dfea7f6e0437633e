// src/utils/http.rs

//! HTTP client utilities.

use std::time::Duration;

use crate::error::Result;
use crate::models::PlacesConfig;

/// Create a configured asynchronous HTTP client.
///
/// The timeout bounds the whole request, body included.
pub fn create_async_client(config: &PlacesConfig) -> Result<reqwest::Client> {
    let client = reqwest::Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_client_from_defaults() {
        assert!(create_async_client(&PlacesConfig::default()).is_ok());
    }
}
