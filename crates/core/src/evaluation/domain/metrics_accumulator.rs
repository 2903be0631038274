use super::error_report::{AggregateReport, ErrorReport};

/// Running sums of per-video errors, reduced into a mean at the end.
///
/// Owned by a single thread; parallel runs send reports back to one place
/// and add them there.
#[derive(Clone, Debug, Default)]
pub struct MetricsAccumulator {
    sum_absolute: f64,
    sum_relative: f64,
    count: usize,
}

impl MetricsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, report: &ErrorReport) {
        self.sum_absolute += report.mse_absolute;
        self.sum_relative += report.mse_relative;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn finish(&self) -> AggregateReport {
        if self.count == 0 {
            return AggregateReport::default();
        }
        let n = self.count as f64;
        AggregateReport {
            mse_absolute: Some(self.sum_absolute / n),
            mse_relative: Some(self.sum_relative / n),
            items: self.count,
        }
    }
}

impl<'a> Extend<&'a ErrorReport> for MetricsAccumulator {
    fn extend<I: IntoIterator<Item = &'a ErrorReport>>(&mut self, iter: I) {
        for report in iter {
            self.add(report);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mean_of_reports() {
        let mut acc = MetricsAccumulator::new();
        acc.extend(&[
            ErrorReport {
                mse_absolute: 10.0,
                mse_relative: 0.1,
            },
            ErrorReport {
                mse_absolute: 30.0,
                mse_relative: 0.3,
            },
        ]);
        let aggregate = acc.finish();
        assert_eq!(aggregate.items, 2);
        assert_relative_eq!(aggregate.mse_absolute.unwrap(), 20.0);
        assert_relative_eq!(aggregate.mse_relative.unwrap(), 0.2);
    }

    #[test]
    fn test_no_reports_gives_empty_aggregate() {
        let aggregate = MetricsAccumulator::new().finish();
        assert!(aggregate.is_empty());
        assert_eq!(aggregate.mse_absolute, None);
        assert_eq!(aggregate.mse_relative, None);
    }
}
