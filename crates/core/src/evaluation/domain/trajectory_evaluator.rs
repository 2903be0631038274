use thiserror::Error;

use crate::shared::crop_geometry::to_relative;
use crate::trajectory::domain::crop_trajectory::CropTrajectory;

use super::error_report::ErrorReport;

/// Two per-frame sequences that must line up do not.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{subject} has {actual} frames, expected {expected}")]
pub struct LengthMismatchError {
    pub subject: &'static str,
    pub actual: usize,
    pub expected: usize,
}

/// Scores a predicted trajectory against ground truth, frame by frame.
pub struct TrajectoryEvaluator;

impl TrajectoryEvaluator {
    /// Absolute MSE in pixels, and relative MSE on offsets divided by
    /// `frame_width`. Sequences must be the same length; empty sequences
    /// score zero.
    pub fn evaluate<P, T>(
        predicted: &[P],
        truth: &[T],
        frame_width: u32,
    ) -> Result<ErrorReport, LengthMismatchError>
    where
        P: Copy + Into<f64>,
        T: Copy + Into<f64>,
    {
        if predicted.len() != truth.len() {
            return Err(LengthMismatchError {
                subject: "predicted trajectory",
                actual: predicted.len(),
                expected: truth.len(),
            });
        }

        let predicted: Vec<f64> = predicted.iter().map(|&x| x.into()).collect();
        let truth: Vec<f64> = truth.iter().map(|&x| x.into()).collect();

        Ok(ErrorReport {
            mse_absolute: mean_squared_error(&predicted, &truth),
            mse_relative: mean_squared_error(
                &to_relative(&predicted, frame_width),
                &to_relative(&truth, frame_width),
            ),
        })
    }

    /// Both trajectories stay inside `[0, frame_width - crop_width]`, so
    /// `mse_relative` never exceeds 1.
    pub fn evaluate_trajectory(
        predicted: &CropTrajectory,
        truth: &CropTrajectory,
    ) -> Result<ErrorReport, LengthMismatchError> {
        Self::evaluate(
            predicted.offsets(),
            truth.offsets(),
            predicted.geometry().frame_width,
        )
    }
}

/// Mean of squared differences over aligned pairs. Zero for empty input.
pub fn mean_squared_error(a: &[f64], b: &[f64]) -> f64 {
    let n = a.len().min(b.len());
    if n == 0 {
        return 0.0;
    }
    let sum: f64 = a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum();
    sum / n as f64
}
