use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use serde::Deserialize;

use crate::media::domain::video_describer::{MediaProbeError, VideoDescriber};
use crate::shared::constants::{DEFAULT_TOOL_TIMEOUT_SECS, FFPROBE_BINARY};
use crate::shared::video_descriptor::VideoDescriptor;

use super::process_runner::{ProcessError, ProcessRunner};

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: Option<ProbeFormat>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    nb_frames: Option<String>,
    duration: Option<String>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
}

/// Describes videos by running `ffprobe` and reading its JSON report.
pub struct FfprobeDescriber {
    binary: PathBuf,
    runner: ProcessRunner,
}

impl FfprobeDescriber {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            runner: ProcessRunner::new(timeout),
        }
    }

    fn command(&self, path: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ])
        .arg(path);
        cmd
    }
}

impl Default for FfprobeDescriber {
    fn default() -> Self {
        Self::new(
            FFPROBE_BINARY,
            Duration::from_secs(DEFAULT_TOOL_TIMEOUT_SECS),
        )
    }
}

impl VideoDescriber for FfprobeDescriber {
    fn describe(&self, path: &Path) -> Result<VideoDescriptor, MediaProbeError> {
        if !path.exists() {
            return Err(MediaProbeError::NotFound(path.to_path_buf()));
        }

        let output = self
            .runner
            .run(&mut self.command(path))
            .map_err(|e| match e {
                ProcessError::Spawn { program, source } | ProcessError::Wait { program, source } => {
                    MediaProbeError::Spawn {
                        tool: program,
                        source,
                    }
                }
                ProcessError::Timeout { timeout, .. } => MediaProbeError::Timeout {
                    path: path.to_path_buf(),
                    secs: timeout.as_secs(),
                },
            })?;

        if !output.success() {
            return Err(MediaProbeError::Failed {
                path: path.to_path_buf(),
                status: output.status.code(),
                stderr: output.stderr.trim().to_string(),
            });
        }

        parse_probe_output(path, output.stdout.as_bytes())
    }
}

/// Builds a descriptor from ffprobe's `-print_format json` output.
///
/// The frame count comes from the stream's `nb_frames` when the container
/// records it, otherwise from duration times frame rate.
pub fn parse_probe_output(path: &Path, json: &[u8]) -> Result<VideoDescriptor, MediaProbeError> {
    let malformed = |reason: String| MediaProbeError::Malformed {
        path: path.to_path_buf(),
        reason,
    };

    let probe: ProbeOutput =
        serde_json::from_slice(json).map_err(|e| malformed(e.to_string()))?;

    let stream = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| MediaProbeError::NoVideoStream(path.to_path_buf()))?;

    let (width, height) = match (stream.width, stream.height) {
        (Some(w), Some(h)) => (w, h),
        _ => return Err(malformed("video stream has no frame size".to_string())),
    };

    let duration = parse_number(stream.duration.as_deref())
        .or_else(|| parse_number(probe.format.as_ref().and_then(|f| f.duration.as_deref())))
        .ok_or_else(|| malformed("no duration reported".to_string()))?;

    if let Some(frames) = stream
        .nb_frames
        .as_deref()
        .and_then(|n| n.parse::<usize>().ok())
        .filter(|&n| n > 0)
    {
        return VideoDescriptor::from_frame_count(path, frames, duration, width, height);
    }

    let fps = stream
        .avg_frame_rate
        .as_deref()
        .and_then(parse_frame_rate)
        .or_else(|| stream.r_frame_rate.as_deref().and_then(parse_frame_rate))
        .ok_or_else(|| malformed("neither frame count nor frame rate reported".to_string()))?;
    let frames = (duration * fps).round() as usize;

    VideoDescriptor::new(path, fps, duration, frames, width, height)
}

fn parse_number(s: Option<&str>) -> Option<f64> {
    s.and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
}

/// Parses a frame rate such as `30000/1001` or `29.97`. `0/0` is `None`.
fn parse_frame_rate(s: &str) -> Option<f64> {
    let rate = match s.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.parse().ok()?;
            let den: f64 = den.parse().ok()?;
            if den == 0.0 {
                return None;
            }
            num / den
        }
        None => s.parse().ok()?,
    };
    (rate.is_finite() && rate > 0.0).then_some(rate)
}
