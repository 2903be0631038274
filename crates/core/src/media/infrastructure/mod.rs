pub mod ffmpeg_crop_renderer;
pub mod ffprobe_describer;
#[cfg(feature = "libav")]
pub mod libav_describer;
pub mod process_runner;
