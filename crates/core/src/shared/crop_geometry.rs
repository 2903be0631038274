use thiserror::Error;

use crate::shared::constants::CROP_ASPECT;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("a {crop_width}px wide vertical crop does not fit a {frame_width}x{frame_height} frame")]
pub struct GeometryError {
    pub frame_width: u32,
    pub frame_height: u32,
    pub crop_width: u32,
}

/// Size of the vertical crop window for a given source frame.
///
/// The crop is always as tall as the source and 9:16 wide, so only the
/// horizontal offset varies from frame to frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropGeometry {
    pub frame_width: u32,
    pub frame_height: u32,
    pub crop_width: u32,
    pub crop_height: u32,
}

impl CropGeometry {
    pub fn for_frame(frame_width: u32, frame_height: u32) -> Result<Self, GeometryError> {
        let (aspect_w, aspect_h) = CROP_ASPECT;
        let crop_width = (u64::from(frame_height) * u64::from(aspect_w) / u64::from(aspect_h)) as u32;

        if crop_width == 0 || crop_width > frame_width {
            return Err(GeometryError {
                frame_width,
                frame_height,
                crop_width,
            });
        }

        Ok(Self {
            frame_width,
            frame_height,
            crop_width,
            crop_height: frame_height,
        })
    }

    /// Largest valid left offset: `frame_width - crop_width`.
    pub fn max_offset(&self) -> u32 {
        self.frame_width - self.crop_width
    }

    /// Offset of a crop centered in the frame, floored.
    pub fn center_offset(&self) -> u32 {
        self.max_offset() / 2
    }

    pub fn clamp_offset(&self, offset: f64) -> f64 {
        offset.clamp(0.0, f64::from(self.max_offset()))
    }

    pub fn contains_offset(&self, offset: u32) -> bool {
        offset <= self.max_offset()
    }
}

/// Maps absolute pixel offsets to `[0, 1]` by dividing by frame width.
pub fn to_relative<T: Copy + Into<f64>>(offsets: &[T], frame_width: u32) -> Vec<f64> {
    let width = f64::from(frame_width);
    offsets.iter().map(|&x| x.into() / width).collect()
}
