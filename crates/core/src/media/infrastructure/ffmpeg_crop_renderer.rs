use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use crate::media::domain::crop_expression::CropExpression;
use crate::media::domain::crop_renderer::{CropRenderer, RenderError};
use crate::shared::constants::{DEFAULT_TOOL_TIMEOUT_SECS, FFMPEG_BINARY};
use crate::shared::video_descriptor::VideoDescriptor;
use crate::trajectory::domain::crop_trajectory::CropTrajectory;

use super::process_runner::{ProcessError, ProcessRunner};

/// Filters longer than this go through `-filter_script:v` instead of argv.
pub const INLINE_FILTER_LIMIT: usize = 64 * 1024;

/// Where ffmpeg reads the crop filter from.
#[derive(Debug, PartialEq, Eq)]
enum FilterArg {
    Inline(String),
    Script(PathBuf),
}

/// Renders crops with the `ffmpeg` binary and a per-frame `crop` filter.
///
/// The destination is overwritten. Audio is copied through untouched.
pub struct FfmpegCropRenderer {
    binary: PathBuf,
    runner: ProcessRunner,
    inline_limit: usize,
}

impl FfmpegCropRenderer {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            runner: ProcessRunner::new(timeout),
            inline_limit: INLINE_FILTER_LIMIT,
        }
    }

    pub fn with_inline_limit(mut self, inline_limit: usize) -> Self {
        self.inline_limit = inline_limit;
        self
    }

    fn build_args(source: &Path, destination: &Path, filter: &FilterArg) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-y", "-v", "error", "-nostdin", "-i"]
            .iter()
            .map(OsString::from)
            .collect();
        args.push(source.into());
        match filter {
            FilterArg::Inline(f) => {
                args.push("-filter:v".into());
                args.push(f.into());
            }
            FilterArg::Script(p) => {
                args.push("-filter_script:v".into());
                args.push(p.into());
            }
        }
        args.extend(["-c:a", "copy"].iter().map(OsString::from));
        args.push(destination.into());
        args
    }
}

impl Default for FfmpegCropRenderer {
    fn default() -> Self {
        Self::new(FFMPEG_BINARY, Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS))
    }
}

impl CropRenderer for FfmpegCropRenderer {
    fn render(
        &self,
        source: &VideoDescriptor,
        destination: &Path,
        trajectory: &CropTrajectory,
    ) -> Result<(), RenderError> {
        if trajectory.is_empty() {
            return Err(RenderError::EmptyTrajectory(destination.to_path_buf()));
        }

        let geometry = trajectory.geometry();
        let expression = CropExpression::from_trajectory(trajectory);
        let filter = expression.to_crop_filter(geometry.crop_width, geometry.crop_height);
        log::debug!(
            "Crop filter for {} has {} segments ({} bytes)",
            destination.display(),
            expression.segment_count(),
            filter.len()
        );

        // The script file must outlive the ffmpeg process.
        let (filter_arg, _script) = if filter.len() <= self.inline_limit {
            (FilterArg::Inline(filter), None)
        } else {
            let mut file = tempfile::Builder::new()
                .prefix("crop-filter-")
                .suffix(".txt")
                .tempfile()
                .map_err(RenderError::Script)?;
            file.write_all(filter.as_bytes())
                .and_then(|()| file.flush())
                .map_err(RenderError::Script)?;
            (FilterArg::Script(file.path().to_path_buf()), Some(file))
        };

        let mut cmd = Command::new(&self.binary);
        cmd.args(Self::build_args(source.path(), destination, &filter_arg));

        let output = self.runner.run(&mut cmd).map_err(|e| match e {
            ProcessError::Spawn { program, source } | ProcessError::Wait { program, source } => {
                RenderError::Spawn {
                    tool: program,
                    source,
                }
            }
            ProcessError::Timeout {
                timeout, stderr, ..
            } => RenderError::Timeout {
                destination: destination.to_path_buf(),
                secs: timeout.as_secs(),
                stderr,
            },
        })?;

        if !output.success() {
            return Err(RenderError::NonZeroExit {
                destination: destination.to_path_buf(),
                status: output.status.code(),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(())
    }
}
