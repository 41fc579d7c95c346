pub mod config;
pub mod device;
pub mod error;
pub mod media_format;
pub mod photo_result;
pub mod state;
