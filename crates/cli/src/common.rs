use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

use verticalize_core::media::domain::crop_renderer::CropRenderer;
use verticalize_core::media::domain::video_describer::VideoDescriber;
use verticalize_core::media::infrastructure::ffmpeg_crop_renderer::FfmpegCropRenderer;
use verticalize_core::media::infrastructure::ffprobe_describer::FfprobeDescriber;
use verticalize_core::pipeline::length_policy::LengthPolicy;
use verticalize_core::shared::constants::{DEFAULT_TOOL_TIMEOUT_SECS, FFMPEG_BINARY, FFPROBE_BINARY};
use verticalize_core::trajectory::domain::estimator_config::{
    ConfigError, EstimatorConfig, NoDetectionPolicy, TargetPolicy,
};

/// Estimator tuning. Precedence: defaults, then `--config`, then flags.
#[derive(Args, Debug)]
pub struct EstimatorArgs {
    /// JSON file with estimator settings.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Frames in the centered moving average (0 or 1 disables it).
    #[arg(long = "smoothing_window")]
    pub smoothing_window: Option<usize>,

    /// Max crop movement in pixels per frame.
    #[arg(long = "max_velocity", conflicts_with = "no_velocity_limit")]
    pub max_velocity: Option<u32>,

    /// Let the crop move any distance between frames.
    #[arg(long = "no_velocity_limit")]
    pub no_velocity_limit: bool,

    /// Weight of the current frame in the exponential smoother, in (0, 1].
    #[arg(long = "ema_alpha")]
    pub ema_alpha: Option<f64>,

    /// Face that drives the crop: highest_confidence, union or ignore.
    #[arg(long = "target_policy")]
    pub target_policy: Option<TargetPolicy>,

    /// Target of frames without faces: hold_last or frame_center.
    #[arg(long = "no_detection_policy")]
    pub no_detection_policy: Option<NoDetectionPolicy>,

    /// Plain center crop on every frame; ignores every other estimator option.
    #[arg(long)]
    pub baseline: bool,
}

impl EstimatorArgs {
    pub fn resolve(&self) -> Result<EstimatorConfig, ConfigError> {
        if self.baseline {
            return Ok(EstimatorConfig::baseline());
        }

        let mut config = match &self.config {
            Some(path) => EstimatorConfig::load(path)?,
            None => EstimatorConfig::default(),
        };
        if let Some(window) = self.smoothing_window {
            config.smoothing_window = window;
        }
        if self.no_velocity_limit {
            config.max_velocity = None;
        } else if let Some(v) = self.max_velocity {
            config.max_velocity = Some(v);
        }
        if let Some(alpha) = self.ema_alpha {
            config.ema_alpha = alpha;
        }
        if let Some(policy) = self.target_policy {
            config.target_policy = policy;
        }
        if let Some(policy) = self.no_detection_policy {
            config.no_detection_policy = policy;
        }

        config.validate()?;
        Ok(config)
    }
}

/// External tools and per-item policies.
#[derive(Args, Debug)]
pub struct ToolArgs {
    /// ffmpeg binary used for rendering.
    #[arg(long, default_value = FFMPEG_BINARY)]
    pub ffmpeg: PathBuf,

    /// ffprobe binary used for reading video metadata.
    #[arg(long, default_value = FFPROBE_BINARY)]
    pub ffprobe: PathBuf,

    /// Seconds before a single ffprobe/ffmpeg call is killed.
    #[arg(long = "timeout_secs", default_value_t = DEFAULT_TOOL_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Feature/video frame count mismatch: strict or truncate.
    #[arg(long = "length_policy", default_value_t = LengthPolicy::Strict)]
    pub length_policy: LengthPolicy,

    /// Read video metadata in-process with libav instead of ffprobe.
    #[cfg(feature = "libav")]
    #[arg(long)]
    pub libav: bool,
}

impl ToolArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn describer(&self) -> Box<dyn VideoDescriber> {
        self.in_process_describer()
            .unwrap_or_else(|| Box::new(FfprobeDescriber::new(&self.ffprobe, self.timeout())))
    }

    pub fn renderer(&self) -> Box<dyn CropRenderer> {
        Box::new(FfmpegCropRenderer::new(&self.ffmpeg, self.timeout()))
    }

    #[cfg(feature = "libav")]
    fn in_process_describer(&self) -> Option<Box<dyn VideoDescriber>> {
        use verticalize_core::media::infrastructure::libav_describer::LibavDescriber;

        if self.libav {
            Some(Box::new(LibavDescriber::new()))
        } else {
            None
        }
    }

    #[cfg(not(feature = "libav"))]
    fn in_process_describer(&self) -> Option<Box<dyn VideoDescriber>> {
        None
    }
}

pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}
