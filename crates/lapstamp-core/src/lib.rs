pub mod config;
pub mod overlay;
pub mod pipeline;
pub mod timestamp;
pub mod video;
