pub mod crop_expression;
pub mod crop_renderer;
pub mod video_describer;
