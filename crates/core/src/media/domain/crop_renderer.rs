use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::video_descriptor::VideoDescriptor;
use crate::trajectory::domain::crop_trajectory::CropTrajectory;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("refusing to render {0}: trajectory has no frames")]
    EmptyTrajectory(PathBuf),
    #[error("failed to write filter script: {0}")]
    Script(#[source] std::io::Error),
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("rendering {destination} timed out after {secs}s; stderr: {stderr}")]
    Timeout {
        destination: PathBuf,
        secs: u64,
        stderr: String,
    },
    #[error("rendering {destination} failed (exit status {status:?}); stderr: {stderr}")]
    NonZeroExit {
        destination: PathBuf,
        status: Option<i32>,
        stdout: String,
        stderr: String,
    },
}

/// Physically crops a video along a trajectory.
///
/// Kept behind a trait so the external tool can be swapped (or stubbed)
/// without touching estimation or evaluation.
pub trait CropRenderer: Send + Sync {
    fn render(
        &self,
        source: &VideoDescriptor,
        destination: &Path,
        trajectory: &CropTrajectory,
    ) -> Result<(), RenderError>;
}
