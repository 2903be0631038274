pub mod crop_trajectory;
pub mod estimator_config;
pub mod offset_smoother;
pub mod target_selector;
pub mod trajectory_estimator;
pub mod velocity_limiter;
