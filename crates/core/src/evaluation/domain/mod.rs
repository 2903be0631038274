pub mod error_report;
pub mod metrics_accumulator;
pub mod trajectory_evaluator;
