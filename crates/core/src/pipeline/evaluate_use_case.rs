use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::evaluation::domain::error_report::AggregateReport;
use crate::evaluation::domain::metrics_accumulator::MetricsAccumulator;
use crate::evaluation::domain::trajectory_evaluator::TrajectoryEvaluator;
use crate::features::domain::feature_source::FeatureSource;
use crate::media::domain::crop_renderer::CropRenderer;
use crate::media::domain::video_describer::VideoDescriber;
use crate::shared::constants::DEFAULT_VIDEO_EXTENSION;
use crate::trajectory::domain::crop_trajectory::CropTrajectory;
use crate::trajectory::domain::trajectory_estimator::TrajectoryEstimator;

use super::batch_executor::BatchExecutor;
use super::item_error::{ItemResult, Stage, StageRunner};
use super::length_policy::LengthPolicy;
use super::output_layout::{item_name, list_feature_files, write_json, OutputLayout, SetupError};
use super::run_reporter::{format_elapsed, RunReporter};
use super::verticalize_use_case::persist;

pub struct EvaluateRequest {
    /// Directory of labeled `*.json` feature files.
    pub validation_set: PathBuf,
    /// Directory holding `<stem>.<video_extension>` for every feature file.
    pub videos_dir: PathBuf,
    pub results_dir: PathBuf,
    pub video_extension: String,
    pub visualize: bool,
}

impl EvaluateRequest {
    pub fn new(
        validation_set: impl Into<PathBuf>,
        videos_dir: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            validation_set: validation_set.into(),
            videos_dir: videos_dir.into(),
            results_dir: results_dir.into(),
            video_extension: DEFAULT_VIDEO_EXTENSION.to_string(),
            visualize: false,
        }
    }

    /// Video paired with a feature file by stem: `a/clip.json` → `<videos>/clip.mp4`.
    pub fn video_path_for(&self, features_path: &Path) -> PathBuf {
        let mut name: OsString = features_path.file_stem().unwrap_or_default().to_os_string();
        name.push(".");
        name.push(&self.video_extension);
        self.videos_dir.join(name)
    }
}

/// Runs the estimator over a labeled validation set and scores it.
///
/// Per item: read features → probe video → estimate → evaluate against
/// ground truth clamped into crop bounds → optionally render predicted and
/// ground-truth crops → persist predicted crops. A failing item is reported,
/// left out of the mean and leaves no `pred_crops` file; it never stops the
/// batch.
pub struct EvaluateUseCase {
    features: Box<dyn FeatureSource>,
    describer: Box<dyn VideoDescriber>,
    renderer: Box<dyn CropRenderer>,
    estimator: TrajectoryEstimator,
    length_policy: LengthPolicy,
    executor: Box<dyn BatchExecutor>,
}

impl EvaluateUseCase {
    pub fn new(
        features: Box<dyn FeatureSource>,
        describer: Box<dyn VideoDescriber>,
        renderer: Box<dyn CropRenderer>,
        estimator: TrajectoryEstimator,
        length_policy: LengthPolicy,
        executor: Box<dyn BatchExecutor>,
    ) -> Self {
        Self {
            features,
            describer,
            renderer,
            estimator,
            length_policy,
            executor,
        }
    }

    pub fn execute(
        &self,
        request: &EvaluateRequest,
        reporter: &mut dyn RunReporter,
    ) -> Result<AggregateReport, SetupError> {
        let start = Instant::now();
        let items = list_feature_files(&request.validation_set)?;
        let layout = OutputLayout::create(&request.results_dir, request.visualize)?;

        let total = items.len();
        if total == 0 {
            reporter.warn(&format!(
                "No feature files found in {}",
                request.validation_set.display()
            ));
        } else {
            reporter.info(&format!(
                "Evaluating {total} videos from {}",
                request.validation_set.display()
            ));
        }

        let mut accumulator = MetricsAccumulator::new();
        let mut done = 0;
        self.executor.execute(
            items,
            &|path: &Path| self.process(path, request, &layout),
            &mut |result| {
                done += 1;
                match result {
                    Ok(outcome) => {
                        for &(stage, ms) in &outcome.timings {
                            reporter.timing(stage, ms);
                        }
                        for warning in &outcome.warnings {
                            reporter.warn(warning);
                        }
                        accumulator.add(&outcome.report);
                        reporter.item_succeeded(&outcome.item);
                    }
                    Err(e) => reporter.item_failed(&e),
                }
                reporter.progress(done, total);
            },
        );

        let aggregate = accumulator.finish();
        match (aggregate.mse_absolute, aggregate.mse_relative) {
            (Some(abs), Some(rel)) => reporter.info(&format!(
                "Mean over {} of {total} videos: mse_absolute {abs:.3}, mse_relative {rel:.6}",
                aggregate.items
            )),
            _ => reporter.warn("No video was evaluated successfully; metrics are null"),
        }

        let metrics_path = layout.metrics_path();
        write_json(&metrics_path, &aggregate).map_err(|e| SetupError::WriteOutput {
            path: metrics_path.clone(),
            source: e,
        })?;
        reporter.info(&format!(
            "Wrote {}. Total time: {}",
            metrics_path.display(),
            format_elapsed(start.elapsed())
        ));
        reporter.summary();

        Ok(aggregate)
    }

    fn process(
        &self,
        features_path: &Path,
        request: &EvaluateRequest,
        layout: &OutputLayout,
    ) -> ItemResult {
        let mut stages = StageRunner::new(item_name(features_path));

        let mut features = stages.run(Stage::ReadFeatures, || self.features.read(features_path))?;
        let mut truth = stages.run(Stage::ReadFeatures, || features.ground_truth())?;

        let video_path = request.video_path_for(features_path);
        let video = stages.run(Stage::Probe, || self.describer.describe(&video_path))?;

        stages.run(Stage::Estimate, || {
            self.length_policy
                .reconcile(&mut features, video.total_frames())
        })?;
        truth.truncate(features.len());
        let trajectory = stages.run(Stage::Estimate, || {
            self.estimator.estimate(&video, features.face_sets())
        })?;

        let (truth_trajectory, adjusted) = CropTrajectory::clamped(&truth, trajectory.geometry());
        if adjusted > 0 {
            let message = format!(
                "{}: clamped {adjusted} ground truth offsets into [0, {}]",
                stages.item(),
                trajectory.geometry().max_offset()
            );
            stages.warn(message);
        }
        let report = stages.run(Stage::Evaluate, || {
            TrajectoryEvaluator::evaluate_trajectory(&trajectory, &truth_trajectory)
        })?;

        if layout.visualize() {
            let video_name = item_name(&video_path);
            let pred_path = layout.pred_crop_video_path(&video_name);
            let true_path = layout.true_crop_video_path(&video_name);
            stages.run(Stage::Render, || {
                self.renderer.render(&video, &pred_path, &trajectory)
            })?;
            stages.run(Stage::Render, || {
                self.renderer.render(&video, &true_path, &truth_trajectory)
            })?;
        }

        let crops_path = layout.pred_crops_path(stages.item());
        stages.run(Stage::Persist, || persist(&crops_path, trajectory.offsets()))?;

        Ok(stages.finish(report))
    }
}
