use std::fmt;
use std::str::FromStr;

use crate::evaluation::domain::trajectory_evaluator::LengthMismatchError;
use crate::features::domain::feature_source::VideoFeatures;

/// What to do when a feature file and its video disagree on frame count.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LengthPolicy {
    /// Reject the item.
    #[default]
    Strict,
    /// Keep the first `min(features, frames)` frames.
    Truncate,
}

impl LengthPolicy {
    /// Aligns `features` with a video of `total_frames` frames, or rejects it.
    pub fn reconcile(
        self,
        features: &mut VideoFeatures,
        total_frames: usize,
    ) -> Result<(), LengthMismatchError> {
        if features.len() == total_frames {
            return Ok(());
        }
        match self {
            LengthPolicy::Strict => Err(LengthMismatchError {
                subject: "feature file",
                actual: features.len(),
                expected: total_frames,
            }),
            LengthPolicy::Truncate => {
                features.truncate(total_frames);
                Ok(())
            }
        }
    }
}

impl fmt::Display for LengthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LengthPolicy::Strict => "strict",
            LengthPolicy::Truncate => "truncate",
        })
    }
}

impl FromStr for LengthPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "strict" => Ok(LengthPolicy::Strict),
            "truncate" => Ok(LengthPolicy::Truncate),
            other => Err(format!(
                "unknown length policy '{other}' (expected strict or truncate)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::domain::face_box::FrameFaceSet;
    use rstest::rstest;

    fn features(frames: usize) -> VideoFeatures {
        VideoFeatures::new(
            "clip.json",
            vec![FrameFaceSet::empty(); frames],
            (0..frames as i32).map(Some).collect(),
        )
    }

    #[rstest]
    #[case::strict(LengthPolicy::Strict)]
    #[case::truncate(LengthPolicy::Truncate)]
    fn test_matching_lengths_pass(#[case] policy: LengthPolicy) {
        let mut f = features(100);
        policy.reconcile(&mut f, 100).unwrap();
        assert_eq!(f.len(), 100);
    }

    #[rstest]
    #[case::more_features(120, 100)]
    #[case::fewer_features(80, 100)]
    fn test_strict_rejects_mismatch(#[case] feature_frames: usize, #[case] video_frames: usize) {
        let mut f = features(feature_frames);
        let err = LengthPolicy::Strict
            .reconcile(&mut f, video_frames)
            .unwrap_err();
        assert_eq!(err.actual, feature_frames);
        assert_eq!(err.expected, video_frames);
        assert_eq!(f.len(), feature_frames);
    }

    #[rstest]
    #[case::more_features(120, 100, 100)]
    #[case::fewer_features(80, 100, 80)]
    fn test_truncate_keeps_common_prefix(
        #[case] feature_frames: usize,
        #[case] video_frames: usize,
        #[case] expected: usize,
    ) {
        let mut f = features(feature_frames);
        LengthPolicy::Truncate.reconcile(&mut f, video_frames).unwrap();
        assert_eq!(f.len(), expected);
        assert_eq!(f.ground_truth().unwrap().len(), expected);
    }

    #[test]
    fn test_parse() {
        assert_eq!("strict".parse::<LengthPolicy>().unwrap(), LengthPolicy::Strict);
        assert_eq!("truncate".parse::<LengthPolicy>().unwrap(), LengthPolicy::Truncate);
        assert!("lenient".parse::<LengthPolicy>().is_err());
        assert_eq!(LengthPolicy::default().to_string(), "strict");
    }
}
