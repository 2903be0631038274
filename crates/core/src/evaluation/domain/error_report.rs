use serde::{Deserialize, Serialize};

/// Error of one predicted trajectory against its ground truth.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Mean squared error in pixels².
    pub mse_absolute: f64,
    /// Mean squared error after dividing offsets by frame width.
    pub mse_relative: f64,
}

impl ErrorReport {
    pub const ZERO: Self = Self {
        mse_absolute: 0.0,
        mse_relative: 0.0,
    };
}

/// Mean error over every successfully evaluated video.
///
/// Serializes as the `metrics.json` document. Both means are `null` when no
/// video could be evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateReport {
    pub mse_absolute: Option<f64>,
    pub mse_relative: Option<f64>,
    #[serde(skip)]
    pub items: usize,
}

impl AggregateReport {
    pub fn is_empty(&self) -> bool {
        self.items == 0
    }
}
