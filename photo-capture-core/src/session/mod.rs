pub mod event_signal;
pub mod frame_counter;
pub mod pipeline;
