use std::path::Path;

use crate::media::domain::video_describer::{MediaProbeError, VideoDescriber};
use crate::shared::video_descriptor::VideoDescriptor;

/// Describes videos in-process through ffmpeg-next (libavformat), without
/// spawning `ffprobe`.
#[derive(Default)]
pub struct LibavDescriber;

impl LibavDescriber {
    pub fn new() -> Self {
        Self
    }
}

impl VideoDescriber for LibavDescriber {
    fn describe(&self, path: &Path) -> Result<VideoDescriptor, MediaProbeError> {
        if !path.exists() {
            return Err(MediaProbeError::NotFound(path.to_path_buf()));
        }
        let malformed = |e: ffmpeg_next::Error| MediaProbeError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        };

        ffmpeg_next::init().map_err(malformed)?;
        let ictx = ffmpeg_next::format::input(path).map_err(malformed)?;

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| MediaProbeError::NoVideoStream(path.to_path_buf()))?;
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(malformed)?;
        let decoder = codec_ctx.decoder().video().map_err(malformed)?;

        let rate = stream.avg_frame_rate();
        let fps = if rate.denominator() != 0 {
            f64::from(rate.numerator()) / f64::from(rate.denominator())
        } else {
            0.0
        };

        let duration = if stream.duration() > 0 {
            stream.duration() as f64 * f64::from(stream.time_base())
        } else {
            ictx.duration() as f64 / f64::from(ffmpeg_next::ffi::AV_TIME_BASE)
        };

        let frames = stream.frames();
        if frames > 0 {
            VideoDescriptor::from_frame_count(
                path,
                frames as usize,
                duration,
                decoder.width(),
                decoder.height(),
            )
        } else {
            let estimated = (duration * fps).round() as usize;
            VideoDescriptor::new(
                path,
                fps,
                duration,
                estimated,
                decoder.width(),
                decoder.height(),
            )
        }
    }
}
