use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::features::domain::feature_source::FeatureSource;
use crate::media::domain::crop_renderer::CropRenderer;
use crate::media::domain::video_describer::VideoDescriber;
use crate::shared::constants::{CROPPED_VIDEO_FILE_NAME, CROPS_FILE_NAME};
use crate::trajectory::domain::crop_trajectory::CropTrajectory;
use crate::trajectory::domain::trajectory_estimator::TrajectoryEstimator;

use super::item_error::{ItemError, ItemFailure, Stage, StageRunner};
use super::length_policy::LengthPolicy;
use super::output_layout::{create_dir, item_name, write_json, SetupError};
use super::run_reporter::{format_elapsed, RunReporter};

#[derive(Error, Debug)]
pub enum VerticalizeError {
    #[error(transparent)]
    Setup(#[from] SetupError),
    #[error(transparent)]
    Item(#[from] ItemError),
}

pub struct VerticalizeRequest {
    pub video_path: PathBuf,
    pub features_path: PathBuf,
    pub output_dir: PathBuf,
    /// Also render `cropped_video.mp4`.
    pub visualize: bool,
}

impl VerticalizeRequest {
    pub fn crops_path(&self) -> PathBuf {
        self.output_dir.join(CROPS_FILE_NAME)
    }

    pub fn cropped_video_path(&self) -> PathBuf {
        self.output_dir.join(CROPPED_VIDEO_FILE_NAME)
    }
}

/// Verticalizes a single video: estimate a crop trajectory from its
/// features, write it as `crops.json`, and optionally render the crop.
pub struct VerticalizeUseCase {
    features: Box<dyn FeatureSource>,
    describer: Box<dyn VideoDescriber>,
    renderer: Box<dyn CropRenderer>,
    estimator: TrajectoryEstimator,
    length_policy: LengthPolicy,
}

impl VerticalizeUseCase {
    pub fn new(
        features: Box<dyn FeatureSource>,
        describer: Box<dyn VideoDescriber>,
        renderer: Box<dyn CropRenderer>,
        estimator: TrajectoryEstimator,
        length_policy: LengthPolicy,
    ) -> Self {
        Self {
            features,
            describer,
            renderer,
            estimator,
            length_policy,
        }
    }

    pub fn execute(
        &self,
        request: &VerticalizeRequest,
        reporter: &mut dyn RunReporter,
    ) -> Result<CropTrajectory, VerticalizeError> {
        let start = Instant::now();
        create_dir(&request.output_dir)?;

        let mut stages = StageRunner::new(item_name(&request.features_path));
        let result = self.run_stages(request, &mut stages, reporter);

        for &(stage, ms) in stages.timings() {
            reporter.timing(stage, ms);
        }
        for warning in stages.warnings() {
            reporter.warn(warning);
        }

        let trajectory = result?;
        reporter.item_succeeded(stages.item());
        reporter.info(&format!(
            "Ready. Total time: {}",
            format_elapsed(start.elapsed())
        ));
        reporter.summary();
        Ok(trajectory)
    }

    fn run_stages(
        &self,
        request: &VerticalizeRequest,
        stages: &mut StageRunner,
        reporter: &mut dyn RunReporter,
    ) -> Result<CropTrajectory, ItemError> {
        let mut features = stages.run(Stage::ReadFeatures, || {
            self.features.read(&request.features_path)
        })?;
        let video = stages.run(Stage::Probe, || self.describer.describe(&request.video_path))?;
        reporter.info(&format!(
            "{}: {}x{}, {} frames at {:.2} fps; {} feature frames",
            request.video_path.display(),
            video.frame_width(),
            video.frame_height(),
            video.total_frames(),
            video.fps(),
            features.len()
        ));

        stages.run(Stage::Estimate, || {
            self.length_policy
                .reconcile(&mut features, video.total_frames())
        })?;
        let trajectory = stages.run(Stage::Estimate, || {
            self.estimator.estimate(&video, features.face_sets())
        })?;

        let crops_path = request.crops_path();
        stages.run(Stage::Persist, || persist(&crops_path, trajectory.offsets()))?;
        reporter.info(&format!(
            "Wrote {} crop offsets to {}",
            trajectory.len(),
            crops_path.display()
        ));

        if request.visualize {
            let destination = request.cropped_video_path();
            stages.run(Stage::Render, || {
                self.renderer.render(&video, &destination, &trajectory)
            })?;
            reporter.info(&format!("Rendered {}", destination.display()));
        }

        Ok(trajectory)
    }
}

pub(crate) fn persist(path: &Path, offsets: &[u32]) -> Result<(), ItemFailure> {
    write_json(path, offsets).map_err(|e| ItemFailure::Persist {
        path: path.to_path_buf(),
        source: e,
    })
}
