use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use thiserror::Error;

use crate::evaluation::domain::error_report::ErrorReport;
use crate::evaluation::domain::trajectory_evaluator::LengthMismatchError;
use crate::features::domain::feature_source::FeatureError;
use crate::media::domain::crop_renderer::RenderError;
use crate::media::domain::video_describer::MediaProbeError;
use crate::shared::crop_geometry::GeometryError;

/// Step of the per-video pipeline, used to attribute timings and failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    ReadFeatures,
    Probe,
    Estimate,
    Evaluate,
    Persist,
    Render,
}

impl Stage {
    pub const ALL: &[Stage] = &[
        Stage::ReadFeatures,
        Stage::Probe,
        Stage::Estimate,
        Stage::Evaluate,
        Stage::Persist,
        Stage::Render,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::ReadFeatures => "read_features",
            Stage::Probe => "probe",
            Stage::Estimate => "estimate",
            Stage::Evaluate => "evaluate",
            Stage::Persist => "persist",
            Stage::Render => "render",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ItemFailure {
    #[error(transparent)]
    Features(#[from] FeatureError),
    #[error(transparent)]
    Probe(#[from] MediaProbeError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Length(#[from] LengthMismatchError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("failed to write {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A failure of one video, tagged with where it happened.
#[derive(Error, Debug)]
#[error("{item}: {stage} failed: {source}")]
pub struct ItemError {
    pub item: String,
    pub stage: Stage,
    #[source]
    pub source: ItemFailure,
}

/// What a successfully processed video hands back to the batch.
#[derive(Clone, Debug, PartialEq)]
pub struct ItemOutcome {
    pub item: String,
    pub report: ErrorReport,
    pub timings: Vec<(Stage, f64)>,
    pub warnings: Vec<String>,
}

pub type ItemResult = Result<ItemOutcome, ItemError>;

/// Runs the stages of one item, timing each and tagging failures.
pub struct StageRunner {
    item: String,
    timings: Vec<(Stage, f64)>,
    warnings: Vec<String>,
}

impl StageRunner {
    pub fn new(item: impl Into<String>) -> Self {
        Self {
            item: item.into(),
            timings: Vec::new(),
            warnings: Vec::new(),
        }
    }

    pub fn item(&self) -> &str {
        &self.item
    }

    pub fn run<T, E>(
        &mut self,
        stage: Stage,
        f: impl FnOnce() -> Result<T, E>,
    ) -> Result<T, ItemError>
    where
        E: Into<ItemFailure>,
    {
        let start = Instant::now();
        let result = f();
        self.timings
            .push((stage, start.elapsed().as_secs_f64() * 1000.0));
        result.map_err(|e| ItemError {
            item: self.item.clone(),
            stage,
            source: e.into(),
        })
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn timings(&self) -> &[(Stage, f64)] {
        &self.timings
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn finish(self, report: ErrorReport) -> ItemOutcome {
        ItemOutcome {
            item: self.item,
            report,
            timings: self.timings,
            warnings: self.warnings,
        }
    }
}
