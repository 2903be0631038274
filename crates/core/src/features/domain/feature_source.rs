use std::path::{Path, PathBuf};

use thiserror::Error;

use super::face_box::FrameFaceSet;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("failed to read features from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed feature file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid face box in {path} at frame {frame}: {reason}")]
    InvalidBox {
        path: PathBuf,
        frame: usize,
        reason: String,
    },
    #[error("feature file {path} has no ground truth crop at frame {frame}")]
    MissingGroundTruth { path: PathBuf, frame: usize },
}

/// Per-frame detections for one video, with optional ground-truth offsets.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoFeatures {
    source: PathBuf,
    face_sets: Vec<FrameFaceSet>,
    ground_truth: Vec<Option<i32>>,
}

impl VideoFeatures {
    /// `ground_truth` must have one entry per frame.
    pub fn new(
        source: impl Into<PathBuf>,
        face_sets: Vec<FrameFaceSet>,
        ground_truth: Vec<Option<i32>>,
    ) -> Self {
        debug_assert_eq!(face_sets.len(), ground_truth.len());
        Self {
            source: source.into(),
            face_sets,
            ground_truth,
        }
    }

    /// Features without labels, as consumed by a plain verticalize run.
    pub fn unlabeled(source: impl Into<PathBuf>, face_sets: Vec<FrameFaceSet>) -> Self {
        let ground_truth = vec![None; face_sets.len()];
        Self::new(source, face_sets, ground_truth)
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn face_sets(&self) -> &[FrameFaceSet] {
        &self.face_sets
    }

    pub fn len(&self) -> usize {
        self.face_sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.face_sets.is_empty()
    }

    /// Ground-truth offsets for every frame; fails on the first unlabeled frame.
    pub fn ground_truth(&self) -> Result<Vec<i32>, FeatureError> {
        self.ground_truth
            .iter()
            .enumerate()
            .map(|(frame, x)| {
                x.ok_or_else(|| FeatureError::MissingGroundTruth {
                    path: self.source.clone(),
                    frame,
                })
            })
            .collect()
    }

    pub fn truncate(&mut self, len: usize) {
        self.face_sets.truncate(len);
        self.ground_truth.truncate(len);
    }
}

/// Loads per-video features from storage.
///
/// Implementations convert whatever on-disk format they read into typed
/// `FrameFaceSet`s at this boundary, so nothing untyped reaches the
/// estimator.
pub trait FeatureSource: Send + Sync {
    fn read(&self, path: &Path) -> Result<VideoFeatures, FeatureError>;
}
