// src/services/places.rs

//! Places text-search client.

use async_trait::async_trait;
use reqwest::Client;

use crate::error::{AppError, Result};
use crate::models::{ApiKey, PlacesConfig};

/// The one query this poller ever issues.
pub const PLACES_QUERY: &str = "restaurant in kajang";

/// A text-search request: the fixed query plus credentials.
#[derive(Debug, Clone)]
pub struct PlacesQuery {
    key: ApiKey,
}

impl PlacesQuery {
    pub fn new(key: ApiKey) -> Self {
        Self { key }
    }

    pub fn text(&self) -> &str {
        PLACES_QUERY
    }

    /// Query parameters sent to the provider, exactly `query` and `key`.
    pub fn params(&self) -> [(&'static str, &str); 2] {
        [("query", PLACES_QUERY), ("key", self.key.expose())]
    }
}

/// Performs the outbound text-search GET.
///
/// Implementations return the raw body of a 2xx response. Transport
/// failures and error statuses must map to errors for which
/// [`AppError::is_transient`] holds.
#[async_trait]
pub trait PlacesSource: Send + Sync {
    async fn text_search(&self, query: &PlacesQuery) -> Result<Vec<u8>>;
}

/// reqwest-backed places source.
pub struct HttpPlacesClient {
    client: Client,
    endpoint: String,
}

impl HttpPlacesClient {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Build a client from places configuration.
    pub fn from_config(config: &PlacesConfig) -> Result<Self> {
        let client = crate::utils::http::create_async_client(config)?;
        Ok(Self::new(client, &config.endpoint))
    }
}

#[async_trait]
impl PlacesSource for HttpPlacesClient {
    async fn text_search(&self, query: &PlacesQuery) -> Result<Vec<u8>> {
        // The request URL carries the API key, so it is dropped from errors.
        let response = self
            .client
            .get(&self.endpoint)
            .query(&query.params())
            .send()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::Http(e.without_url()))?;
        Ok(body.to_vec())
    }
}
