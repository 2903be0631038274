/// Vertical crop aspect ratio as `(width, height)`.
pub const CROP_ASPECT: (u32, u32) = (9, 16);

pub const CROPS_FILE_NAME: &str = "crops.json";
pub const CROPPED_VIDEO_FILE_NAME: &str = "cropped_video.mp4";
pub const METRICS_FILE_NAME: &str = "metrics.json";

pub const PRED_CROPS_DIR: &str = "pred_crops";
pub const TRUE_CROP_VIDEOS_DIR: &str = "true_crop_videos";
pub const PRED_CROP_VIDEOS_DIR: &str = "pred_crop_videos";

pub const FEATURE_FILE_EXTENSION: &str = "json";
pub const DEFAULT_VIDEO_EXTENSION: &str = "mp4";

/// Upper bound for any single ffprobe/ffmpeg invocation (10 minutes).
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 600;

pub const FFMPEG_BINARY: &str = "ffmpeg";
pub const FFPROBE_BINARY: &str = "ffprobe";
