/// Domain interface for temporal smoothing of a per-frame offset series.
pub trait OffsetSmoother: Send + Sync {
    fn smooth(&self, series: &[f64]) -> Vec<f64>;
}

/// EMA (Exponential Moving Average) smoother, seeded with the first sample.
///
/// Formula: `ema[t] = alpha * current + (1 - alpha) * ema[t-1]`
/// `alpha = 1.0` passes the series through unchanged.
pub struct ExponentialSmoother {
    alpha: f64,
}

impl ExponentialSmoother {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }
}

impl OffsetSmoother for ExponentialSmoother {
    fn smooth(&self, series: &[f64]) -> Vec<f64> {
        let mut result = Vec::with_capacity(series.len());
        let mut prev: Option<f64> = None;
        for &current in series {
            let smoothed = match prev {
                None => current,
                Some(p) => self.alpha * current + (1.0 - self.alpha) * p,
            };
            result.push(smoothed);
            prev = Some(smoothed);
        }
        result
    }
}

/// Centered moving average over `window` frames.
///
/// The window shrinks at the ends of the series instead of padding, so the
/// first and last frames are averaged over fewer samples. Windows of 0 or 1
/// pass the series through unchanged.
pub struct MovingAverageSmoother {
    window: usize,
}

impl MovingAverageSmoother {
    pub fn new(window: usize) -> Self {
        Self { window }
    }
}

impl OffsetSmoother for MovingAverageSmoother {
    fn smooth(&self, series: &[f64]) -> Vec<f64> {
        if self.window <= 1 {
            return series.to_vec();
        }

        let before = (self.window - 1) / 2;
        let after = self.window / 2;

        (0..series.len())
            .map(|i| {
                let start = i.saturating_sub(before);
                let end = (i + after + 1).min(series.len());
                let slice = &series[start..end];
                slice.iter().sum::<f64>() / slice.len() as f64
            })
            .collect()
    }
}
