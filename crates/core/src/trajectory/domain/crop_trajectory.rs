use thiserror::Error;

use crate::shared::crop_geometry::CropGeometry;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("offset {offset} at frame {frame} exceeds the maximum of {max_offset}")]
pub struct OffsetOutOfBounds {
    pub frame: usize,
    pub offset: u32,
    pub max_offset: u32,
}

/// Horizontal crop offset per frame, each within `0..=frame_width - crop_width`.
///
/// Immutable once built; construction checks every offset against the
/// geometry it was computed for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CropTrajectory {
    offsets: Vec<u32>,
    geometry: CropGeometry,
}

impl CropTrajectory {
    pub fn new(offsets: Vec<u32>, geometry: CropGeometry) -> Result<Self, OffsetOutOfBounds> {
        let max_offset = geometry.max_offset();
        if let Some((frame, &offset)) = offsets.iter().enumerate().find(|&(_, &x)| x > max_offset)
        {
            return Err(OffsetOutOfBounds {
                frame,
                offset,
                max_offset,
            });
        }
        Ok(Self { offsets, geometry })
    }

    /// For offsets already clamped to `geometry` by construction.
    pub(crate) fn from_bounded(offsets: Vec<u32>, geometry: CropGeometry) -> Self {
        debug_assert!(offsets.iter().all(|&x| geometry.contains_offset(x)));
        Self { offsets, geometry }
    }

    /// Clamps arbitrary (e.g. hand-labeled) offsets into bounds.
    ///
    /// Returns the trajectory and how many frames had to be moved.
    pub fn clamped(offsets: &[i32], geometry: CropGeometry) -> (Self, usize) {
        let max_offset = i64::from(geometry.max_offset());
        let mut adjusted = 0;
        let offsets = offsets
            .iter()
            .map(|&x| {
                let clamped = i64::from(x).clamp(0, max_offset);
                if clamped != i64::from(x) {
                    adjusted += 1;
                }
                clamped as u32
            })
            .collect();
        (Self { offsets, geometry }, adjusted)
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn geometry(&self) -> CropGeometry {
        self.geometry
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Largest absolute change between consecutive frames.
    pub fn max_step(&self) -> u32 {
        self.offsets
            .windows(2)
            .map(|w| w[0].abs_diff(w[1]))
            .max()
            .unwrap_or(0)
    }
}
