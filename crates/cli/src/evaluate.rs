mod common;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use common::{init_logging, EstimatorArgs, ToolArgs};
use verticalize_core::features::infrastructure::json_feature_reader::JsonFeatureReader;
use verticalize_core::pipeline::batch_executor::{BatchExecutor, SequentialBatchExecutor};
use verticalize_core::pipeline::evaluate_use_case::{EvaluateRequest, EvaluateUseCase};
use verticalize_core::pipeline::infrastructure::threaded_batch_executor::ThreadedBatchExecutor;
use verticalize_core::pipeline::run_reporter::LogRunReporter;
use verticalize_core::shared::constants::DEFAULT_VIDEO_EXTENSION;
use verticalize_core::trajectory::domain::trajectory_estimator::TrajectoryEstimator;

/// Score the crop estimator against a labeled validation set.
///
/// Writes metrics.json and pred_crops/ into the results directory and
/// prints the aggregate metrics to stdout.
#[derive(Parser)]
#[command(name = "evaluate")]
struct Cli {
    /// Directory of labeled feature files (*.json with x_crop per frame).
    #[arg(long = "validation_set")]
    validation_set: PathBuf,

    /// Directory holding <stem>.<video_extension> for every feature file.
    #[arg(long)]
    videos: PathBuf,

    /// Output directory for metrics and predicted crops.
    #[arg(long = "results_dir")]
    results_dir: PathBuf,

    /// Also render predicted and ground-truth crop videos.
    #[arg(long)]
    visualize: bool,

    /// Videos processed in parallel.
    #[arg(long, default_value_t = 1)]
    jobs: usize,

    /// Extension of the videos paired with feature files.
    #[arg(long = "video_extension", default_value = DEFAULT_VIDEO_EXTENSION)]
    video_extension: String,

    #[command(flatten)]
    estimator: EstimatorArgs,

    #[command(flatten)]
    tools: ToolArgs,
}

fn main() {
    init_logging();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let config = cli.estimator.resolve()?;
    log::debug!("Estimator config: {config:?}");

    let use_case = EvaluateUseCase::new(
        Box::new(JsonFeatureReader::new()),
        cli.tools.describer(),
        cli.tools.renderer(),
        TrajectoryEstimator::new(config),
        cli.tools.length_policy,
        executor(cli.jobs),
    );
    let request = EvaluateRequest {
        video_extension: cli.video_extension.trim_start_matches('.').to_string(),
        visualize: cli.visualize,
        ..EvaluateRequest::new(cli.validation_set, cli.videos, cli.results_dir)
    };

    let aggregate = use_case.execute(&request, &mut LogRunReporter::default())?;
    println!("{}", serde_json::to_string_pretty(&aggregate)?);
    Ok(())
}

fn executor(jobs: usize) -> Box<dyn BatchExecutor> {
    if jobs > 1 {
        log::info!("Processing with {jobs} workers");
        Box::new(ThreadedBatchExecutor::new(jobs))
    } else {
        Box::new(SequentialBatchExecutor::new())
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.jobs == 0 {
        return Err("--jobs must be at least 1".into());
    }
    if !cli.validation_set.is_dir() {
        return Err(format!(
            "Validation set is not a directory: {}",
            cli.validation_set.display()
        )
        .into());
    }
    if !cli.videos.is_dir() {
        return Err(format!("Videos directory not found: {}", cli.videos.display()).into());
    }
    if cli.video_extension.trim_start_matches('.').is_empty() {
        return Err("--video_extension must not be empty".into());
    }
    Ok(())
}
