use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_SMOOTHING_WINDOW: usize = 15;
pub const DEFAULT_MAX_VELOCITY: u32 = 24;
pub const DEFAULT_EMA_ALPHA: f64 = 1.0;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("ema_alpha must be in (0, 1], got {0}")]
    InvalidAlpha(f64),
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Which detection drives the crop center on a frame with faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPolicy {
    /// Center of the most confident face; ties go to the larger box.
    HighestConfidence,
    /// Center of the bounding box enclosing every face.
    Union,
    /// Disregard detections and center the crop.
    Ignore,
}

/// What a frame without detections targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoDetectionPolicy {
    /// Keep the last detected center; the frame center until the first detection.
    HoldLast,
    /// Revert to the frame center.
    FrameCenter,
}

impl TargetPolicy {
    pub const ALL: &[TargetPolicy] = &[
        TargetPolicy::HighestConfidence,
        TargetPolicy::Union,
        TargetPolicy::Ignore,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            TargetPolicy::HighestConfidence => "highest_confidence",
            TargetPolicy::Union => "union",
            TargetPolicy::Ignore => "ignore",
        }
    }
}

impl NoDetectionPolicy {
    pub const ALL: &[NoDetectionPolicy] =
        &[NoDetectionPolicy::HoldLast, NoDetectionPolicy::FrameCenter];

    fn as_str(&self) -> &'static str {
        match self {
            NoDetectionPolicy::HoldLast => "hold_last",
            NoDetectionPolicy::FrameCenter => "frame_center",
        }
    }
}

impl fmt::Display for TargetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for NoDetectionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                format!("target policy must be one of: highest_confidence, union, ignore, got '{s}'")
            })
    }
}

impl FromStr for NoDetectionPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| {
                format!("no-detection policy must be one of: hold_last, frame_center, got '{s}'")
            })
    }
}

/// Tuning for [`TrajectoryEstimator`](super::trajectory_estimator::TrajectoryEstimator).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    pub target_policy: TargetPolicy,
    pub no_detection_policy: NoDetectionPolicy,
    /// Frames in the centered moving average. 0 or 1 disables it.
    pub smoothing_window: usize,
    /// Weight of the current frame in the causal EMA. 1.0 disables it.
    pub ema_alpha: f64,
    /// Max pixel delta between consecutive offsets. `None` is unbounded.
    pub max_velocity: Option<u32>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            target_policy: TargetPolicy::HighestConfidence,
            no_detection_policy: NoDetectionPolicy::HoldLast,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
            ema_alpha: DEFAULT_EMA_ALPHA,
            max_velocity: Some(DEFAULT_MAX_VELOCITY),
        }
    }
}

impl EstimatorConfig {
    /// Center crop on every frame: detections ignored, no smoothing.
    pub fn baseline() -> Self {
        Self {
            target_policy: TargetPolicy::Ignore,
            no_detection_policy: NoDetectionPolicy::FrameCenter,
            smoothing_window: 0,
            ema_alpha: 1.0,
            max_velocity: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.ema_alpha > 0.0 && self.ema_alpha <= 1.0) {
            return Err(ConfigError::InvalidAlpha(self.ema_alpha));
        }
        Ok(())
    }
}
