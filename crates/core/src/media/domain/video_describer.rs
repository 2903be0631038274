use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::video_descriptor::VideoDescriptor;

#[derive(Error, Debug)]
pub enum MediaProbeError {
    #[error("video file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },
    #[error("probing {path} timed out after {secs}s")]
    Timeout { path: PathBuf, secs: u64 },
    #[error("probe of {path} failed (exit status {status:?}): {stderr}")]
    Failed {
        path: PathBuf,
        status: Option<i32>,
        stderr: String,
    },
    #[error("unreadable probe output for {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
    #[error("no video stream in {0}")]
    NoVideoStream(PathBuf),
    #[error("invalid stream metadata for {path}: {reason}")]
    InvalidMetadata { path: PathBuf, reason: String },
}

/// Extracts stream facts from a video file.
///
/// A failure is permanent for that file: implementations do not retry.
pub trait VideoDescriber: Send + Sync {
    fn describe(&self, path: &Path) -> Result<VideoDescriptor, MediaProbeError>;
}
