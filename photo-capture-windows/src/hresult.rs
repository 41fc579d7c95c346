use photo_capture_core::models::error::{CaptureError, PlatformStatus};

pub(crate) fn status_of(error: &windows::core::Error) -> PlatformStatus {
    PlatformStatus(error.code().0)
}

/// Map a failed platform call to `PipelineStepFailed` carrying its HRESULT.
pub(crate) fn step_failed(operation: &'static str) -> impl Fn(windows::core::Error) -> CaptureError {
    move |e| {
        log::error!("failed {}: {}", operation, e);
        CaptureError::step_failed(operation, status_of(&e))
    }
}

/// Map a refused stream binding to `FormatRejected`.
pub(crate) fn format_rejected(context: String) -> impl FnOnce(windows::core::Error) -> CaptureError {
    move |e| CaptureError::FormatRejected {
        reason: format!("{}: {}", context, e.message()),
        status: status_of(&e),
    }
}
