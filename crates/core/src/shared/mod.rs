pub mod constants;
pub mod crop_geometry;
pub mod video_descriptor;
