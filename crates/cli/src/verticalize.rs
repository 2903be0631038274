mod common;

use std::path::PathBuf;
use std::process;

use clap::Parser;

use common::{init_logging, EstimatorArgs, ToolArgs};
use verticalize_core::features::infrastructure::json_feature_reader::JsonFeatureReader;
use verticalize_core::pipeline::run_reporter::LogRunReporter;
use verticalize_core::pipeline::verticalize_use_case::{VerticalizeRequest, VerticalizeUseCase};
use verticalize_core::trajectory::domain::trajectory_estimator::TrajectoryEstimator;

/// Crop a landscape video to 9:16, following the faces in its feature file.
#[derive(Parser)]
#[command(name = "verticalize")]
struct Cli {
    /// Landscape source video.
    #[arg(long = "input_video_path")]
    input_video_path: PathBuf,

    /// Per-frame face detections (JSON array, one entry per frame).
    #[arg(long = "input_features_path")]
    input_features_path: PathBuf,

    /// Receives crops.json (and cropped_video.mp4 with --visualize).
    #[arg(long = "output_dir_path")]
    output_dir_path: PathBuf,

    /// Also render the cropped video.
    #[arg(long)]
    visualize: bool,

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

    let use_case = VerticalizeUseCase::new(
        Box::new(JsonFeatureReader::new()),
        cli.tools.describer(),
        cli.tools.renderer(),
        TrajectoryEstimator::new(config),
        cli.tools.length_policy,
    );
    let request = VerticalizeRequest {
        video_path: cli.input_video_path,
        features_path: cli.input_features_path,
        output_dir: cli.output_dir_path,
        visualize: cli.visualize,
    };

    use_case.execute(&request, &mut LogRunReporter::default())?;
    Ok(())
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if !cli.input_video_path.exists() {
        return Err(format!(
            "Input video not found: {}",
            cli.input_video_path.display()
        )
        .into());
    }
    if !cli.input_features_path.exists() {
        return Err(format!(
            "Feature file not found: {}",
            cli.input_features_path.display()
        )
        .into());
    }
    if cli.output_dir_path.is_file() {
        return Err(format!(
            "Output path is a file: {}",
            cli.output_dir_path.display()
        )
        .into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("verticalize").chain(args.iter().copied()))
    }

    #[test]
    fn test_parses_underscore_flags() {
        let cli = parse(&[
            "--input_video_path",
            "in.mp4",
            "--input_features_path",
            "in.json",
            "--output_dir_path",
            "out",
            "--visualize",
        ])
        .unwrap();
        assert_eq!(cli.input_video_path, PathBuf::from("in.mp4"));
        assert_eq!(cli.output_dir_path, PathBuf::from("out"));
        assert!(cli.visualize);
    }

    #[test]
    fn test_paths_are_required() {
        assert!(parse(&["--input_video_path", "in.mp4"]).is_err());
    }

    #[test]
    fn test_validate_reports_missing_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("in.mp4");
        let features = dir.path().join("in.json");
        let out = dir.path().join("out");
        let args = |v: &PathBuf, f: &PathBuf| {
            parse(&[
                "--input_video_path",
                v.to_str().unwrap(),
                "--input_features_path",
                f.to_str().unwrap(),
                "--output_dir_path",
                out.to_str().unwrap(),
            ])
            .unwrap()
        };

        let err = validate(&args(&video, &features)).unwrap_err();
        assert!(err.to_string().starts_with("Input video not found"));

        fs::write(&video, b"").unwrap();
        let err = validate(&args(&video, &features)).unwrap_err();
        assert!(err.to_string().starts_with("Feature file not found"));

        fs::write(&features, b"[]").unwrap();
        assert!(validate(&args(&video, &features)).is_ok());
    }
}
