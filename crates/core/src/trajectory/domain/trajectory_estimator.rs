use crate::features::domain::face_box::FrameFaceSet;
use crate::shared::crop_geometry::{CropGeometry, GeometryError};
use crate::shared::video_descriptor::VideoDescriptor;

use super::crop_trajectory::CropTrajectory;
use super::estimator_config::{EstimatorConfig, TargetPolicy};
use super::offset_smoother::{ExponentialSmoother, MovingAverageSmoother, OffsetSmoother};
use super::target_selector::TargetSelector;
use super::velocity_limiter::VelocityLimiter;

/// Absorbs float error from smoothing so that e.g. an average of 400.0
/// computed as 399.9999999 still floors to 400.
const FLOOR_TOLERANCE: f64 = 1e-6;

/// Turns per-frame face detections into a smooth, bounded crop trajectory.
///
/// Stages: target center per frame → raw offset (clamped) → EMA → centered
/// moving average → floor and re-clamp → velocity limit. The output has
/// `min(face_sets.len(), total_frames)` offsets.
pub struct TrajectoryEstimator {
    config: EstimatorConfig,
}

impl TrajectoryEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn baseline() -> Self {
        Self::new(EstimatorConfig::baseline())
    }

    pub fn estimate(
        &self,
        video: &VideoDescriptor,
        face_sets: &[FrameFaceSet],
    ) -> Result<CropTrajectory, GeometryError> {
        let geometry = video.crop_geometry()?;
        let frames = face_sets.len().min(video.total_frames());

        // Every target is the frame center and smoothing a constant is a no-op.
        if self.config.target_policy == TargetPolicy::Ignore {
            let centered = vec![geometry.center_offset(); frames];
            return Ok(CropTrajectory::from_bounded(centered, geometry));
        }

        let raw = self.raw_offsets(&geometry, &face_sets[..frames]);
        let smoothed = self.smooth(&raw);
        let floored: Vec<u32> = smoothed
            .iter()
            .map(|&x| geometry.clamp_offset((x + FLOOR_TOLERANCE).floor()) as u32)
            .collect();
        let limited = VelocityLimiter::new(self.config.max_velocity).limit(&floored);

        Ok(CropTrajectory::from_bounded(limited, geometry))
    }

    fn raw_offsets(&self, geometry: &CropGeometry, face_sets: &[FrameFaceSet]) -> Vec<f64> {
        let mut selector = TargetSelector::new(
            self.config.target_policy,
            self.config.no_detection_policy,
            geometry.frame_width,
        );
        let half_crop = f64::from(geometry.crop_width) / 2.0;

        face_sets
            .iter()
            .map(|faces| geometry.clamp_offset(selector.select(faces) - half_crop))
            .collect()
    }

    fn smooth(&self, raw: &[f64]) -> Vec<f64> {
        let ema = ExponentialSmoother::new(self.config.ema_alpha).smooth(raw);
        MovingAverageSmoother::new(self.config.smoothing_window).smooth(&ema)
    }
}

impl Default for TrajectoryEstimator {
    fn default() -> Self {
        Self::new(EstimatorConfig::default())
    }
}
