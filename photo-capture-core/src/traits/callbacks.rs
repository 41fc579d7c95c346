use std::fmt;
use std::time::Duration;

use crate::models::error::PlatformStatus;

/// Kind of an asynchronous capture-engine notification.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EngineEventKind {
    Initialized,
    PreviewStarted,
    PreviewStopped,
    PhotoTaken,
    /// An error surfaced out-of-band by the engine.
    Error,
    /// Any notification the pipeline does not act on.
    Other(String),
}

impl fmt::Display for EngineEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized => f.write_str("initialized"),
            Self::PreviewStarted => f.write_str("preview started"),
            Self::PreviewStopped => f.write_str("preview stopped"),
            Self::PhotoTaken => f.write_str("photo taken"),
            Self::Error => f.write_str("error"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

/// A capture-engine notification with the status of the operation it reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineEvent {
    pub kind: EngineEventKind,
    pub status: PlatformStatus,
}

impl EngineEvent {
    pub fn new(kind: EngineEventKind, status: PlatformStatus) -> Self {
        Self { kind, status }
    }

    pub fn succeeded(kind: EngineEventKind) -> Self {
        Self::new(kind, PlatformStatus::OK)
    }
}

/// One frame delivered on a preview stream. Borrowed for the callback's duration.
#[derive(Debug, Clone, Copy)]
pub struct PreviewFrame<'a> {
    pub stream_index: u32,
    pub timestamp: Option<Duration>,
    pub data: &'a [u8],
}

/// Receives pipeline-level notifications from the capture engine.
///
/// Called on engine-owned threads, concurrently with the controller.
pub trait EventCallback: Send + Sync {
    fn on_event(&self, event: &EngineEvent);
}

/// Receives preview frames. May be invoked for several frames in parallel.
pub trait SampleCallback: Send + Sync {
    fn on_sample(&self, frame: &PreviewFrame<'_>);
}
