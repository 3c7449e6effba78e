//! Iris CLI - drives one end-to-end classification training run
//!
//! Recreates the demo project on the hosted service, uploads the labeled
//! images listed in the input file, trains an iteration, promotes it to the
//! project default, and classifies one local image against it.

mod config;

use clap::Parser;
use iris_abstraction::PredictionApi;
use iris_client::{PredictionClient, TrainingClient};
use iris_workflow::{run, RunConfig, StdoutProgressSink, DEFAULT_POLL_INTERVAL};
use std::io::BufRead;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Iris - image-classification training demo
///
/// Drives the hosted training service end-to-end from one labeled-image
/// input file to one prediction against the freshly trained model. The
/// training key is read from the IRIS_TRAINING_KEY environment variable.
#[derive(Parser, Debug)]
#[command(name = "iris", author, version, about = "Iris - image-classification training demo")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Path to the labeled-image input file (JSON array of {Urls, Tags})
    #[arg(long, default_value = "imagesData.json")]
    data: PathBuf,

    /// Path to the local image classified after training
    #[arg(long, default_value = "mostropolis-test.jpg")]
    image: PathBuf,

    /// Name of the demo project to recreate (destructive if it exists)
    #[arg(long, default_value = "TeamDemo")]
    project_name: String,

    /// Description for the recreated project
    #[arg(long, default_value = "Demo project for Tech coffee talk")]
    description: String,

    /// Service endpoint base URL (defaults to the hosted service)
    #[arg(long)]
    endpoint: Option<String>,

    /// Exit immediately instead of waiting for Enter
    #[arg(long)]
    no_wait: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level: Level = args.log_level.parse().unwrap_or(Level::WARN);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let training_key = config::training_key()?;
    let training = match args.endpoint.clone() {
        Some(endpoint) => TrainingClient::with_base_url(training_key, endpoint),
        None => TrainingClient::with_training_key(training_key),
    };

    let run_config = RunConfig {
        project_name: args.project_name.clone(),
        project_description: args.description.clone(),
        data_path: args.data.clone(),
        image_path: args.image.clone(),
        poll_interval: DEFAULT_POLL_INTERVAL,
    };

    let endpoint = args.endpoint.clone();
    let progress = StdoutProgressSink;
    run(
        &training,
        move |prediction_key| match endpoint {
            Some(endpoint) => {
                Box::new(PredictionClient::with_base_url(prediction_key, endpoint))
                    as Box<dyn PredictionApi>
            }
            None => Box::new(PredictionClient::new(prediction_key)),
        },
        &run_config,
        &progress,
    )
    .await?;

    if !args.no_wait {
        println!("Press Enter to exit.");
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
    }
    Ok(())
}
