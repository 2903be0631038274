pub mod evaluation;
pub mod features;
pub mod media;
pub mod pipeline;
pub mod shared;
pub mod trajectory;
