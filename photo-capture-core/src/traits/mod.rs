pub mod callbacks;
pub mod capture_engine;
pub mod device_provider;
pub mod pipeline_delegate;
