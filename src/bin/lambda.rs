//! AWS Lambda entry point for the places poller.
//!
//! Deploy with `cargo lambda build --release --features lambda`
//! and trigger on a schedule.
//!
//! ## Environment Variables
//!
//! - `STREAM_NAME`: destination Kinesis stream (required)
//! - `GOOGLE_API_KEY`: places provider credential (required)
//! - `PLACES_TIMEOUT_SECS`, `PLACES_MAX_ATTEMPTS`, `PLACES_BACKOFF_FACTOR`: optional overrides
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use lambda_runtime::{Error as LambdaError, LambdaEvent, service_fn};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use places_poller::lambda;

#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    // Initialize tracing for Lambda
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Places poller starting...");

    let poller = lambda::bootstrap().await?;
    let poller = &poller;

    lambda_runtime::run(service_fn(move |event: LambdaEvent<Value>| async move {
        lambda::handler(event, poller).await
    }))
    .await
}
