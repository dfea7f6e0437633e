//! Places poller CLI
//!
//! Local execution entry point. For AWS Lambda, use `places-poller-lambda`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use places_poller::{
    config::load_config,
    error::Result,
    publisher::{LocalStreamPublisher, RecordPublisher},
    services::{HttpPlacesClient, PLACES_QUERY, PlacesPoller},
};

/// Polls Google Places and republishes results onto a stream
#[derive(Parser, Debug)]
#[command(name = "places-poller", version, about)]
struct Cli {
    /// Path to an optional TOML config file
    #[arg(short, long, default_value = "places-poller.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one fetch-and-publish cycle
    Run {
        /// Publish to `<dir>/<stream>.jsonl` instead of Kinesis
        #[arg(long, value_name = "DIR")]
        local_stream: Option<PathBuf>,
    },

    /// Validate configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Pick the publisher for a local run.
async fn build_publisher(local_stream: Option<PathBuf>) -> Result<Arc<dyn RecordPublisher>> {
    if let Some(dir) = local_stream {
        log::info!("Publishing to local stream under {}", dir.display());
        return Ok(Arc::new(LocalStreamPublisher::new(dir)));
    }

    #[cfg(feature = "kinesis")]
    {
        Ok(Arc::new(
            places_poller::publisher::KinesisPublisher::from_env().await,
        ))
    }

    #[cfg(not(feature = "kinesis"))]
    {
        Err(places_poller::error::AppError::config(
            "Built without the 'kinesis' feature; pass --local-stream <DIR>",
        ))
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli.config)?;
    config.validate()?;

    match cli.command {
        Command::Run { local_stream } => {
            log::info!(
                "Polling \"{}\" into stream {}",
                PLACES_QUERY,
                config.stream.name
            );

            let source = HttpPlacesClient::from_config(&config.places)?;
            let publisher = build_publisher(local_stream).await?;
            let poller = PlacesPoller::new(&config, Arc::new(source), publisher);

            let result = poller.invoke().await;
            println!("{}", serde_json::to_string_pretty(&result)?);

            Ok(if result.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Validate => {
            log::info!("✓ Config OK (stream: {})", config.stream.name);
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e}");
            ExitCode::FAILURE
        }
    }
}
