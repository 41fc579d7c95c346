//! # photo-capture-core
//!
//! Platform-agnostic still-photo capture core library.
//!
//! Drives a camera through a capture pipeline to produce one still photo
//! after the preview stream has stabilized. Platform backends (Windows Media
//! Foundation, the in-process virtual camera) implement the `DeviceProvider`
//! and `CaptureEngine` traits and plug into the generic `PipelineController`.
//!
//! ## Architecture
//!
//! ```text
//! photo-capture-core (this crate)
//! ├── traits/          ← DeviceProvider, CaptureEngine, sinks, callbacks, PipelineDelegate
//! ├── models/          ← CaptureError, PipelineState, MediaFormat, PhotoConfiguration, etc.
//! ├── registry/        ← DeviceRegistry (enumerate, select by index, activate)
//! ├── negotiation/     ← sink-compatible video/photo format derivation
//! ├── binding/         ← preview/photo sink stream binding
//! ├── session/         ← PipelineController, EventSignal, FrameCounter
//! ├── storage/         ← photo digest, metadata sidecar
//! └── virtual_camera/  ← in-process devices and engine
//! ```

pub mod binding;
pub mod models;
pub mod negotiation;
pub mod registry;
pub mod session;
pub mod storage;
pub mod traits;
pub mod virtual_camera;

// Re-export key types at crate root for convenience.
pub use models::config::PhotoConfiguration;
pub use models::device::{DeviceDescriptor, StreamRole};
pub use models::error::{CaptureError, PlatformStatus};
pub use models::media_format::{
    FrameSize, ImageFormat, ImageSubtype, InterlaceMode, MajorKind, MediaFormat, Ratio,
    VideoFormat, VideoSubtype,
};
pub use models::photo_result::{PhotoMetadata, PhotoResult};
pub use models::state::{PipelineState, PipelineStep};
pub use registry::device_registry::DeviceRegistry;
pub use session::event_signal::EventSignal;
pub use session::frame_counter::FrameCounter;
pub use session::pipeline::PipelineController;
pub use traits::callbacks::{EngineEvent, EngineEventKind, EventCallback, PreviewFrame, SampleCallback};
pub use traits::capture_engine::{CaptureEngine, CaptureSource, PhotoSink, PreviewSink};
pub use traits::device_provider::DeviceProvider;
pub use traits::pipeline_delegate::PipelineDelegate;
