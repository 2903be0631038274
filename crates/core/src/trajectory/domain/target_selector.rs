use crate::features::domain::face_box::{FaceBox, FrameFaceSet};

use super::estimator_config::{NoDetectionPolicy, TargetPolicy};

/// Picks the horizontal point the crop should center on, frame by frame.
///
/// Stateful: with [`NoDetectionPolicy::HoldLast`] the last detected center
/// carries over empty frames, so frames must be fed in order.
pub struct TargetSelector {
    target_policy: TargetPolicy,
    no_detection_policy: NoDetectionPolicy,
    frame_width: u32,
    last_center: Option<f64>,
}

impl TargetSelector {
    pub fn new(
        target_policy: TargetPolicy,
        no_detection_policy: NoDetectionPolicy,
        frame_width: u32,
    ) -> Self {
        Self {
            target_policy,
            no_detection_policy,
            frame_width,
            last_center: None,
        }
    }

    pub fn frame_center(&self) -> f64 {
        f64::from(self.frame_width) / 2.0
    }

    pub fn select(&mut self, faces: &FrameFaceSet) -> f64 {
        let detected = match self.target_policy {
            TargetPolicy::Ignore => return self.frame_center(),
            TargetPolicy::HighestConfidence => most_confident(faces.faces()).map(FaceBox::center_x),
            TargetPolicy::Union => faces.horizontal_span().map(|(l, r)| (l + r) / 2.0),
        };

        match detected {
            Some(center) => {
                self.last_center = Some(center);
                center
            }
            None => match self.no_detection_policy {
                NoDetectionPolicy::HoldLast => {
                    self.last_center.unwrap_or_else(|| self.frame_center())
                }
                NoDetectionPolicy::FrameCenter => self.frame_center(),
            },
        }
    }
}

/// Highest confidence wins (missing counts as 0), then larger area, then
/// earlier position in the list.
fn most_confident(faces: &[FaceBox]) -> Option<&FaceBox> {
    let mut best: Option<&FaceBox> = None;
    for face in faces {
        let better = match best {
            None => true,
            Some(b) => {
                let (fc, bc) = (face.confidence.unwrap_or(0.0), b.confidence.unwrap_or(0.0));
                fc > bc || (fc == bc && face.area() > b.area())
            }
        };
        if better {
            best = Some(face);
        }
    }
    best
}
