//! COM callback objects forwarding capture-engine notifications to the core traits.

use std::sync::Arc;
use std::time::Duration;

use windows::Win32::Media::MediaFoundation::*;
use windows_core::{implement, Ref, Result, GUID};

use photo_capture_core::models::error::PlatformStatus;
use photo_capture_core::traits::callbacks::{
    EngineEvent, EngineEventKind, EventCallback, PreviewFrame, SampleCallback,
};

/// Translate an extended event type into the pipeline's event kind.
pub fn event_kind(extended_type: &GUID) -> EngineEventKind {
    match *extended_type {
        t if t == MF_CAPTURE_ENGINE_INITIALIZED => EngineEventKind::Initialized,
        t if t == MF_CAPTURE_ENGINE_PREVIEW_STARTED => EngineEventKind::PreviewStarted,
        t if t == MF_CAPTURE_ENGINE_PREVIEW_STOPPED => EngineEventKind::PreviewStopped,
        t if t == MF_CAPTURE_ENGINE_PHOTO_TAKEN => EngineEventKind::PhotoTaken,
        t if t == MF_CAPTURE_ENGINE_ERROR => EngineEventKind::Error,
        other => EngineEventKind::Other(format!("{:?}", other)),
    }
}

#[implement(IMFCaptureEngineOnEventCallback)]
pub struct EventForwarder {
    target: Arc<dyn EventCallback>,
}

impl EventForwarder {
    pub fn new(target: Arc<dyn EventCallback>) -> Self {
        Self { target }
    }
}

impl IMFCaptureEngineOnEventCallback_Impl for EventForwarder_Impl {
    fn OnEvent(&self, pevent: Ref<'_, IMFMediaEvent>) -> Result<()> {
        let event = pevent.ok()?;
        unsafe {
            let kind = event
                .GetExtendedType()
                .map(|t| event_kind(&t))
                .unwrap_or_else(|_| EngineEventKind::Other("untyped".into()));
            let status = event
                .GetStatus()
                .map(|hr| PlatformStatus(hr.0))
                .unwrap_or(PlatformStatus::FAIL);

            self.target.on_event(&EngineEvent::new(kind, status));
        }
        Ok(())
    }
}

#[implement(IMFCaptureEngineOnSampleCallback)]
pub struct SampleForwarder {
    stream_index: u32,
    target: Arc<dyn SampleCallback>,
}

impl SampleForwarder {
    pub fn new(stream_index: u32, target: Arc<dyn SampleCallback>) -> Self {
        Self {
            stream_index,
            target,
        }
    }
}

impl IMFCaptureEngineOnSampleCallback_Impl for SampleForwarder_Impl {
    fn OnSample(&self, psample: Ref<'_, IMFSample>) -> Result<()> {
        let sample = psample.ok()?;
        unsafe {
            // Sample time is in 100 ns units.
            let timestamp = sample
                .GetSampleTime()
                .ok()
                .filter(|t| *t >= 0)
                .map(|t| Duration::from_nanos(t as u64 * 100));

            let buffer = sample.ConvertToContiguousBuffer()?;
            let mut data: *mut u8 = std::ptr::null_mut();
            let mut length: u32 = 0;
            buffer.Lock(&mut data, None, Some(&mut length))?;

            if !data.is_null() {
                let bytes = std::slice::from_raw_parts(data, length as usize);
                self.target.on_sample(&PreviewFrame {
                    stream_index: self.stream_index,
                    timestamp,
                    data: bytes,
                });
            }

            buffer.Unlock()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extended_types_map_to_pipeline_events() {
        assert_eq!(event_kind(&MF_CAPTURE_ENGINE_INITIALIZED), EngineEventKind::Initialized);
        assert_eq!(event_kind(&MF_CAPTURE_ENGINE_PHOTO_TAKEN), EngineEventKind::PhotoTaken);
        assert_eq!(event_kind(&MF_CAPTURE_ENGINE_ERROR), EngineEventKind::Error);
        assert!(matches!(
            event_kind(&MF_CAPTURE_ENGINE_RECORD_STARTED),
            EngineEventKind::Other(_)
        ));
    }
}
