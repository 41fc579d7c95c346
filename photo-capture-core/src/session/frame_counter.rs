use std::sync::atomic::{AtomicU64, Ordering};

use crate::traits::callbacks::{PreviewFrame, SampleCallback};

/// Sample callback that acknowledges and discards preview frames.
///
/// Frame-level processing (e.g. motion-triggered capture) hooks in here.
#[derive(Debug, Default)]
pub struct FrameCounter {
    frames: AtomicU64,
    bytes: AtomicU64,
}

impl FrameCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }
}

impl SampleCallback for FrameCounter {
    fn on_sample(&self, frame: &PreviewFrame<'_>) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(frame.data.len() as u64, Ordering::Relaxed);
    }
}
