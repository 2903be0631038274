pub mod batch_executor;
pub mod evaluate_use_case;
pub mod infrastructure;
pub mod item_error;
pub mod length_policy;
pub mod output_layout;
pub mod run_reporter;
pub mod verticalize_use_case;
