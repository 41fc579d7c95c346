use std::sync::Arc;

use crate::models::device::StreamRole;
use crate::models::error::{CaptureError, PlatformStatus};
use crate::models::media_format::{MajorKind, MediaFormat};
use crate::traits::callbacks::SampleCallback;
use crate::traits::capture_engine::{PhotoSink, PreviewSink};

fn require_kind(format: &MediaFormat, expected: MajorKind, sink: &str) -> Result<(), CaptureError> {
    if format.kind() == expected {
        return Ok(());
    }
    Err(CaptureError::FormatRejected {
        reason: format!("{sink} sink accepts {expected} formats, got {format}"),
        status: PlatformStatus::INVALID_MEDIA_TYPE,
    })
}

/// Bind a video format to the preview sink and attach the frame callback.
///
/// The preview sink is bound once per run, so no prior bindings are cleared.
/// Returns the sink stream index the callback is attached to.
pub fn bind_preview<S: PreviewSink + ?Sized>(
    sink: &S,
    role: StreamRole,
    format: &MediaFormat,
    callback: Arc<dyn SampleCallback>,
) -> Result<u32, CaptureError> {
    require_kind(format, MajorKind::Video, "preview")?;

    let stream_index = sink.add_stream(role, format)?;
    sink.set_sample_callback(stream_index, callback)?;

    log::debug!("bound {format} to preview stream {stream_index} ({role})");
    Ok(stream_index)
}

/// Bind an image format to the photo sink, replacing any earlier binding.
pub fn bind_photo<S: PhotoSink + ?Sized>(
    sink: &S,
    role: StreamRole,
    format: &MediaFormat,
) -> Result<u32, CaptureError> {
    require_kind(format, MajorKind::Image, "photo")?;

    sink.remove_all_streams()?;
    let stream_index = sink.add_stream(role, format)?;

    log::debug!("bound {format} to photo stream {stream_index} ({role})");
    Ok(stream_index)
}
