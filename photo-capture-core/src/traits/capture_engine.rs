use std::path::Path;
use std::sync::Arc;

use crate::models::device::StreamRole;
use crate::models::error::CaptureError;
use crate::models::media_format::MediaFormat;
use crate::traits::callbacks::{EventCallback, SampleCallback};

/// The active capture source, queried for its native stream formats.
pub trait CaptureSource: Send + Sync {
    /// The format the device is currently producing on the stream for `role`.
    fn current_media_format(&self, role: StreamRole) -> Result<MediaFormat, CaptureError>;
}

/// Live preview destination.
pub trait PreviewSink: Send + Sync {
    /// Connect the source stream for `role` to this sink with `format`.
    ///
    /// Returns the sink stream index. Fails with `FormatRejected` when the
    /// driver path cannot satisfy the format.
    fn add_stream(&self, role: StreamRole, format: &MediaFormat) -> Result<u32, CaptureError>;

    /// Deliver frames arriving on `stream_index` to `callback`.
    fn set_sample_callback(
        &self,
        stream_index: u32,
        callback: Arc<dyn SampleCallback>,
    ) -> Result<(), CaptureError>;
}

/// Still-photo destination writing the encoded image to a file.
pub trait PhotoSink: Send + Sync {
    /// Drop every stream binding. A no-op on an empty sink.
    fn remove_all_streams(&self) -> Result<(), CaptureError>;

    /// Connect the source stream for `role` to this sink with `format`.
    fn add_stream(&self, role: StreamRole, format: &MediaFormat) -> Result<u32, CaptureError>;

    fn set_output_file(&self, path: &Path) -> Result<(), CaptureError>;
}

/// Interface for a platform capture engine.
///
/// Owns the source and both sinks; the accessors return shared handles to
/// them, the way the platform hands out reference-counted interfaces.
/// `start_preview` and `take_photo` return once the request is accepted;
/// completion is reported through the `EventCallback` passed to `initialize`.
pub trait CaptureEngine: Send {
    type Device: Send;
    type Source: CaptureSource;
    type Preview: PreviewSink;
    type Photo: PhotoSink;

    /// Bind the engine to `device`, or to the system default device when None.
    fn initialize(
        &mut self,
        events: Arc<dyn EventCallback>,
        device: Option<Self::Device>,
    ) -> Result<(), CaptureError>;

    fn source(&self) -> Result<Self::Source, CaptureError>;

    fn preview_sink(&self) -> Result<Self::Preview, CaptureError>;

    fn photo_sink(&self) -> Result<Self::Photo, CaptureError>;

    fn start_preview(&mut self) -> Result<(), CaptureError>;

    fn take_photo(&mut self) -> Result<(), CaptureError>;
}
