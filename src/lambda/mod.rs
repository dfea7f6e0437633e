// src/lambda/mod.rs

//! AWS Lambda handler for the poller.
//!
//! Collaborators are built once per execution environment by [`bootstrap`]
//! and reused by every warm invocation:
//! 1. Configuration from the environment (`STREAM_NAME`, `GOOGLE_API_KEY`)
//! 2. reqwest client for the places provider
//! 3. Kinesis client from the default AWS config chain

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde_json::Value;
use tracing::{info, instrument};

use crate::error::Result;
use crate::models::{Config, InvocationResult};
use crate::publisher::KinesisPublisher;
use crate::services::{HttpPlacesClient, PlacesPoller};

/// Build the poller for this execution environment.
pub async fn bootstrap() -> Result<PlacesPoller> {
    let config = Config::from_env()?;
    config.validate()?;

    info!(
        stream = %config.stream.name,
        max_attempts = config.retry.max_attempts,
        timeout_secs = config.places.timeout_secs,
        "Poller configured"
    );

    let source = HttpPlacesClient::from_config(&config.places)?;
    let publisher = KinesisPublisher::from_env().await;

    Ok(PlacesPoller::new(
        &config,
        Arc::new(source),
        Arc::new(publisher),
    ))
}

/// Main Lambda handler function.
///
/// The event payload only triggers the run; its contents are ignored.
/// Failures are reported through the returned status code, never as a
/// function error.
#[instrument(skip_all, fields(request_id = %event.context.request_id))]
pub async fn handler(
    event: LambdaEvent<Value>,
    poller: &PlacesPoller,
) -> std::result::Result<InvocationResult, LambdaError> {
    let result = poller.invoke().await;
    info!(
        status_code = result.status_code,
        body = %result.body,
        "Invocation finished"
    );
    Ok(result)
}
