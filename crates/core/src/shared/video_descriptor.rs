use std::path::{Path, PathBuf};

use crate::media::domain::video_describer::MediaProbeError;
use crate::shared::crop_geometry::{CropGeometry, GeometryError};

/// Relative slack allowed between `total_frames` and `fps * duration_seconds`.
const FRAME_COUNT_TOLERANCE: f64 = 0.01;

/// Read-only stream facts about a source video.
///
/// Fields are private so a descriptor can only exist in a validated state.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoDescriptor {
    path: PathBuf,
    fps: f64,
    duration_seconds: f64,
    total_frames: usize,
    frame_width: u32,
    frame_height: u32,
}

impl VideoDescriptor {
    pub fn new(
        path: impl Into<PathBuf>,
        fps: f64,
        duration_seconds: f64,
        total_frames: usize,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Self, MediaProbeError> {
        let path = path.into();
        let invalid = |reason: String| MediaProbeError::InvalidMetadata {
            path: path.clone(),
            reason,
        };

        if !(fps.is_finite() && fps > 0.0) {
            return Err(invalid(format!("fps must be positive, got {fps}")));
        }
        if !(duration_seconds.is_finite() && duration_seconds > 0.0) {
            return Err(invalid(format!(
                "duration must be positive, got {duration_seconds}"
            )));
        }
        if total_frames == 0 {
            return Err(invalid("stream reports zero frames".to_string()));
        }
        if frame_width == 0 || frame_height == 0 {
            return Err(invalid(format!(
                "frame size must be positive, got {frame_width}x{frame_height}"
            )));
        }

        let expected = fps * duration_seconds;
        let slack = (total_frames as f64 * FRAME_COUNT_TOLERANCE).max(1.0);
        if (total_frames as f64 - expected).abs() > slack {
            return Err(invalid(format!(
                "{total_frames} frames is inconsistent with {fps:.3} fps over {duration_seconds:.3}s"
            )));
        }

        Ok(Self {
            path,
            fps,
            duration_seconds,
            total_frames,
            frame_width,
            frame_height,
        })
    }

    /// Builds a descriptor from container-level counts, deriving fps as
    /// `total_frames / duration_seconds`.
    pub fn from_frame_count(
        path: impl Into<PathBuf>,
        total_frames: usize,
        duration_seconds: f64,
        frame_width: u32,
        frame_height: u32,
    ) -> Result<Self, MediaProbeError> {
        let fps = if duration_seconds > 0.0 {
            total_frames as f64 / duration_seconds
        } else {
            0.0
        };
        Self::new(
            path,
            fps,
            duration_seconds,
            total_frames,
            frame_width,
            frame_height,
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn duration_seconds(&self) -> f64 {
        self.duration_seconds
    }

    pub fn total_frames(&self) -> usize {
        self.total_frames
    }

    pub fn frame_width(&self) -> u32 {
        self.frame_width
    }

    pub fn frame_height(&self) -> u32 {
        self.frame_height
    }

    pub fn crop_geometry(&self) -> Result<CropGeometry, GeometryError> {
        CropGeometry::for_frame(self.frame_width, self.frame_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn full_hd() -> VideoDescriptor {
        VideoDescriptor::new("/tmp/test.mp4", 25.0, 4.0, 100, 1920, 1080).unwrap()
    }

    #[test]
    fn test_construction() {
        let d = full_hd();
        assert_eq!(d.path(), Path::new("/tmp/test.mp4"));
        assert_eq!(d.fps(), 25.0);
        assert_eq!(d.duration_seconds(), 4.0);
        assert_eq!(d.total_frames(), 100);
        assert_eq!(d.frame_width(), 1920);
        assert_eq!(d.frame_height(), 1080);
    }

    #[test]
    fn test_clone_is_independent() {
        let d = full_hd();
        let cloned = d.clone();
        assert_eq!(d, cloned);
    }

    #[test]
    fn test_from_frame_count_derives_fps() {
        let d = VideoDescriptor::from_frame_count("a.mp4", 300, 10.0, 1280, 720).unwrap();
        assert_relative_eq!(d.fps(), 30.0);
    }

    #[test]
    fn test_rounding_tolerance_accepted() {
        // 29.97 fps over 10.01s is 299.99 frames
        let d = VideoDescriptor::new("a.mp4", 29.97, 10.01, 300, 1280, 720);
        assert!(d.is_ok());
    }

    #[rstest]
    #[case::zero_fps(0.0, 4.0, 100, 1920, 1080)]
    #[case::nan_fps(f64::NAN, 4.0, 100, 1920, 1080)]
    #[case::zero_duration(25.0, 0.0, 100, 1920, 1080)]
    #[case::zero_frames(25.0, 4.0, 0, 1920, 1080)]
    #[case::zero_width(25.0, 4.0, 100, 0, 1080)]
    #[case::zero_height(25.0, 4.0, 100, 1920, 0)]
    #[case::inconsistent_count(25.0, 4.0, 500, 1920, 1080)]
    fn test_invalid_metadata_rejected(
        #[case] fps: f64,
        #[case] duration: f64,
        #[case] frames: usize,
        #[case] w: u32,
        #[case] h: u32,
    ) {
        let err = VideoDescriptor::new("bad.mp4", fps, duration, frames, w, h).unwrap_err();
        assert!(matches!(err, MediaProbeError::InvalidMetadata { .. }));
    }

    #[test]
    fn test_crop_geometry_derived_from_height() {
        let g = full_hd().crop_geometry().unwrap();
        assert_eq!(g.crop_width, 607);
    }
}
