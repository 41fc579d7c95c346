use std::fmt;

use super::error::CaptureError;
use super::photo_result::PhotoResult;

/// Pipeline steps, used to report where a run failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineStep {
    SelectDevice,
    ActivateSource,
    StartPreview,
    AwaitStability,
    TakePhoto,
}

impl fmt::Display for PipelineStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::SelectDevice => "select device",
            Self::ActivateSource => "activate source",
            Self::StartPreview => "start preview",
            Self::AwaitStability => "await stability",
            Self::TakePhoto => "take photo",
        };
        f.write_str(name)
    }
}

/// Capture pipeline state machine.
///
/// State transitions:
/// ```text
/// uninitialized → source bound → preview active → capturing photo → photo complete
///        ↓              ↓               ↓                ↓
///        └──────────────┴───── failed (terminal) ────────┘
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineState {
    Uninitialized,
    SourceBound,
    PreviewActive,
    CapturingPhoto,
    PhotoComplete(Box<PhotoResult>),
    Failed { step: PipelineStep, error: CaptureError },
}

impl PipelineState {
    pub fn is_preview_active(&self) -> bool {
        matches!(self, Self::PreviewActive)
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::PhotoComplete(_))
    }

    /// The step and cause of a failed run.
    pub fn failure(&self) -> Option<(PipelineStep, &CaptureError)> {
        match self {
            Self::Failed { step, error } => Some((*step, error)),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::SourceBound => "source bound",
            Self::PreviewActive => "preview active",
            Self::CapturingPhoto => "capturing photo",
            Self::PhotoComplete(_) => "photo complete",
            Self::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Failed { step, error } => write!(f, "failed at {step}: {error}"),
            other => f.write_str(other.name()),
        }
    }
}
