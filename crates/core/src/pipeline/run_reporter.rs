use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::item_error::{ItemError, Stage};

/// Run-scoped reporter for pipeline events.
///
/// Constructed by the caller and passed into a use case, so output can be
/// redirected or silenced per run instead of through global state. Only the
/// thread that drives the run calls it; workers hand their timings and
/// failures back with their results.
pub trait RunReporter: Send {
    /// Report item-level progress.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a stage took for one item.
    fn timing(&mut self, stage: Stage, duration_ms: f64);

    fn item_succeeded(&mut self, item: &str);

    /// Record a failed item. The run carries on.
    fn item_failed(&mut self, error: &ItemError);

    fn info(&mut self, message: &str);

    fn warn(&mut self, message: &str);

    /// Emit an end-of-run summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent reporter that discards all events.
pub struct NullRunReporter;

impl RunReporter for NullRunReporter {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: Stage, _duration_ms: f64) {}
    fn item_succeeded(&mut self, _item: &str) {}
    fn item_failed(&mut self, _error: &ItemError) {}
    fn info(&mut self, _message: &str) {}
    fn warn(&mut self, _message: &str) {}
}

/// Reporter backed by the `log` crate, with per-stage timing and failure
/// tallies for the summary.
///
/// Progress output is throttled to every `throttle_items` items.
pub struct LogRunReporter {
    throttle_items: usize,
    timings: BTreeMap<Stage, Vec<f64>>,
    failures: BTreeMap<Stage, Vec<String>>,
    succeeded: usize,
    warnings: usize,
    start_time: Instant,
}

impl LogRunReporter {
    pub fn new(throttle_items: usize) -> Self {
        Self {
            throttle_items: throttle_items.max(1),
            timings: BTreeMap::new(),
            failures: BTreeMap::new(),
            succeeded: 0,
            warnings: 0,
            start_time: Instant::now(),
        }
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> usize {
        self.failures.values().map(Vec::len).sum()
    }

    pub fn warnings(&self) -> usize {
        self.warnings
    }

    /// Items that failed at `stage`.
    pub fn failures_for(&self, stage: Stage) -> &[String] {
        self.failures.get(&stage).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn timings_for(&self, stage: Stage) -> Option<&[f64]> {
        self.timings.get(&stage).map(|v| v.as_slice())
    }

    /// Returns the formatted summary, or `None` if nothing was processed.
    pub fn summary_string(&self) -> Option<String> {
        let items = self.succeeded + self.failed();
        if items == 0 && self.timings.is_empty() {
            return None;
        }

        let elapsed = self.start_time.elapsed();
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        let mut lines = vec![format!(
            "Run summary ({items} items, {} failed, {} total):",
            self.failed(),
            format_elapsed(elapsed)
        )];

        for (stage, durations) in &self.timings {
            let total_ms: f64 = durations.iter().sum();
            let avg_ms = if durations.is_empty() {
                0.0
            } else {
                total_ms / durations.len() as f64
            };
            lines.push(format!(
                "  {:13}: avg {avg_ms:8.1}ms  total {total_ms:9.0}ms",
                stage.as_str()
            ));
        }

        for (stage, items) in &self.failures {
            lines.push(format!("  failed at {stage}: {}", items.join(", ")));
        }

        if self.warnings > 0 {
            lines.push(format!("  warnings: {}", self.warnings));
        }

        if items > 0 && elapsed_ms > 0.0 {
            let rate = items as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {rate:.2} items/s"));
        }

        Some(lines.join("\n"))
    }
}

impl Default for LogRunReporter {
    fn default() -> Self {
        Self::new(10)
    }
}

impl RunReporter for LogRunReporter {
    fn progress(&mut self, current: usize, total: usize) {
        if total > 0 && (current % self.throttle_items == 0 || current == total) {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Processed {current}/{total} items ({pct:.1}%)");
        }
    }

    fn timing(&mut self, stage: Stage, duration_ms: f64) {
        self.timings.entry(stage).or_default().push(duration_ms);
    }

    fn item_succeeded(&mut self, item: &str) {
        self.succeeded += 1;
        log::debug!("{item}: done");
    }

    fn item_failed(&mut self, error: &ItemError) {
        self.failures
            .entry(error.stage)
            .or_default()
            .push(error.item.clone());
        log::error!("{error}");
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn warn(&mut self, message: &str) {
        self.warnings += 1;
        log::warn!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}

/// Formats a duration as `HH:MM:SS`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::domain::feature_source::FeatureError;
    use crate::pipeline::item_error::ItemFailure;
    use rstest::rstest;
    use std::path::PathBuf;

    fn failure(item: &str, stage: Stage) -> ItemError {
        ItemError {
            item: item.to_string(),
            stage,
            source: ItemFailure::Features(FeatureError::MissingGroundTruth {
                path: PathBuf::from(item),
                frame: 0,
            }),
        }
    }

    #[test]
    fn test_null_reporter_all_methods_are_noop() {
        let mut reporter = NullRunReporter;
        reporter.progress(1, 10);
        reporter.timing(Stage::Estimate, 5.0);
        reporter.item_succeeded("a.json");
        reporter.item_failed(&failure("b.json", Stage::Probe));
        reporter.info("hello");
        reporter.warn("careful");
        reporter.summary();
    }

    #[test]
    fn test_counts_successes_and_failures_by_stage() {
        let mut reporter = LogRunReporter::new(10);
        reporter.item_succeeded("a.json");
        reporter.item_failed(&failure("b.json", Stage::Probe));
        reporter.item_failed(&failure("c.json", Stage::Probe));
        reporter.item_failed(&failure("d.json", Stage::Render));

        assert_eq!(reporter.succeeded(), 1);
        assert_eq!(reporter.failed(), 3);
        assert_eq!(reporter.failures_for(Stage::Probe), ["b.json", "c.json"]);
        assert_eq!(reporter.failures_for(Stage::Render), ["d.json"]);
        assert!(reporter.failures_for(Stage::Estimate).is_empty());
    }

    #[test]
    fn test_timing_records_values() {
        let mut reporter = LogRunReporter::new(10);
        reporter.timing(Stage::Probe, 20.0);
        reporter.timing(Stage::Probe, 30.0);
        reporter.timing(Stage::Render, 5.0);

        assert_eq!(reporter.timings_for(Stage::Probe).unwrap(), &[20.0, 30.0]);
        assert_eq!(reporter.timings_for(Stage::Render).unwrap(), &[5.0]);
        assert!(reporter.timings_for(Stage::Evaluate).is_none());
    }

    #[test]
    fn test_summary_lists_stages_and_failures() {
        let mut reporter = LogRunReporter::new(10);
        reporter.timing(Stage::Estimate, 12.0);
        reporter.item_succeeded("a.json");
        reporter.item_failed(&failure("b.json", Stage::Probe));
        reporter.warn("clamped");

        let summary = reporter.summary_string().unwrap();
        assert!(summary.contains("Run summary (2 items, 1 failed"));
        assert!(summary.contains("estimate"));
        assert!(summary.contains("failed at probe: b.json"));
        assert!(summary.contains("warnings: 1"));
    }

    #[test]
    fn test_empty_summary_returns_none() {
        assert!(LogRunReporter::new(10).summary_string().is_none());
    }

    #[test]
    fn test_default_throttle() {
        assert_eq!(LogRunReporter::default().throttle_items, 10);
        assert_eq!(LogRunReporter::new(0).throttle_items, 1);
    }

    #[rstest]
    #[case(0, "00:00:00")]
    #[case(59, "00:00:59")]
    #[case(61, "00:01:01")]
    #[case(3_725, "01:02:05")]
    #[case(90_000, "25:00:00")]
    fn test_format_elapsed(#[case] secs: u64, #[case] expected: &str) {
        assert_eq!(format_elapsed(Duration::from_secs(secs)), expected);
    }
}
