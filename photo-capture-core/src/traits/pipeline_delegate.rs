use crate::models::error::CaptureError;
use crate::models::state::{PipelineState, PipelineStep};

/// Observer for pipeline progress.
///
/// Called on the controller thread, synchronously with each transition.
pub trait PipelineDelegate: Send + Sync {
    /// Called when the pipeline state changes.
    fn on_state_changed(&self, state: &PipelineState);

    /// Called when a step fails, before the pipeline enters `Failed`.
    fn on_error(&self, step: PipelineStep, error: &CaptureError);
}
