pub mod face_box;
pub mod feature_source;
