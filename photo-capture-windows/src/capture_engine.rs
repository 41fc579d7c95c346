//! `IMFCaptureEngine` behind the core `CaptureEngine` seam.

use std::path::Path;
use std::sync::Arc;

use windows::core::{Interface, HSTRING, IUnknown};
use windows::Win32::Media::MediaFoundation::*;
use windows::Win32::System::Com::{CoCreateInstance, CLSCTX_INPROC_SERVER};

use photo_capture_core::models::device::StreamRole;
use photo_capture_core::models::error::{CaptureError, PlatformStatus};
use photo_capture_core::models::media_format::MediaFormat;
use photo_capture_core::traits::callbacks::{EventCallback, SampleCallback};
use photo_capture_core::traits::capture_engine::{
    CaptureEngine, CaptureSource, PhotoSink, PreviewSink,
};

use crate::callbacks::{EventForwarder, SampleForwarder};
use crate::device_enumerator::MfDevice;
use crate::hresult::{format_rejected, status_of, step_failed};
use crate::media_type::{from_media_type, to_media_type};

const PREFERRED_STREAM_FOR_VIDEO_PREVIEW: u32 = 0xFFFF_FFFA;
const PREFERRED_STREAM_FOR_PHOTO: u32 = 0xFFFF_FFF8;

fn source_stream(role: StreamRole) -> u32 {
    match role {
        StreamRole::Preview => PREFERRED_STREAM_FOR_VIDEO_PREVIEW,
        StreamRole::Photo => PREFERRED_STREAM_FOR_PHOTO,
    }
}

/// Media Foundation capture engine.
///
/// Create and drive it on a thread holding a
/// [`MediaFoundationRuntime`](crate::MediaFoundationRuntime).
pub struct MfCaptureEngine {
    engine: IMFCaptureEngine,
    device: Option<MfDevice>,
    initialized: bool,
    previewing: bool,
}

// SAFETY: The capture engine is free-threaded in the MTA; all mutation goes
// through `&mut self`.
unsafe impl Send for MfCaptureEngine {}

impl MfCaptureEngine {
    pub fn new() -> Result<Self, CaptureError> {
        unsafe {
            let factory: IMFCaptureEngineClassFactory =
                CoCreateInstance(&CLSID_MFCaptureEngineClassFactory, None, CLSCTX_INPROC_SERVER)
                    .map_err(step_failed("create engine factory"))?;
            let engine: IMFCaptureEngine = factory
                .CreateInstance(&CLSID_MFCaptureEngine)
                .map_err(step_failed("create MFCaptureEngine"))?;

            Ok(Self {
                engine,
                device: None,
                initialized: false,
                previewing: false,
            })
        }
    }

    fn require_initialized(&self, operation: &'static str) -> Result<(), CaptureError> {
        if self.initialized {
            Ok(())
        } else {
            Err(CaptureError::step_failed(operation, PlatformStatus::NOT_INITIALIZED))
        }
    }

    fn sink<T: Interface>(
        &self,
        kind: MF_CAPTURE_ENGINE_SINK_TYPE,
        operation: &'static str,
    ) -> Result<T, CaptureError> {
        self.require_initialized(operation)?;
        unsafe {
            self.engine
                .GetSink(kind)
                .map_err(step_failed("GetSink"))?
                .cast::<T>()
                .map_err(step_failed(operation))
        }
    }
}

impl CaptureEngine for MfCaptureEngine {
    type Device = MfDevice;
    type Source = MfCaptureSource;
    type Preview = MfPreviewSink;
    type Photo = MfPhotoSink;

    fn initialize(
        &mut self,
        events: Arc<dyn EventCallback>,
        device: Option<MfDevice>,
    ) -> Result<(), CaptureError> {
        if self.initialized {
            return Err(CaptureError::step_failed("Initialize", PlatformStatus::INVALID_REQUEST));
        }

        unsafe {
            let callback: IMFCaptureEngineOnEventCallback = EventForwarder::new(events).into();
            let video_source: Option<IUnknown> = device
                .as_ref()
                .map(|d| d.source.cast::<IUnknown>())
                .transpose()
                .map_err(step_failed("QueryInterface media source"))?;

            self.engine
                .Initialize(&callback, None::<&IMFAttributes>, None::<&IUnknown>, video_source.as_ref())
                .map_err(|e| CaptureError::from_status("MFCaptureEngine initialize", status_of(&e)))?;
        }

        self.device = device;
        self.initialized = true;
        Ok(())
    }

    fn source(&self) -> Result<MfCaptureSource, CaptureError> {
        self.require_initialized("GetSource")?;
        let source = unsafe { self.engine.GetSource() }.map_err(step_failed("GetSource"))?;
        Ok(MfCaptureSource { source })
    }

    fn preview_sink(&self) -> Result<MfPreviewSink, CaptureError> {
        let sink = self.sink(MF_CAPTURE_ENGINE_SINK_TYPE_PREVIEW, "QI preview sink")?;
        Ok(MfPreviewSink { sink })
    }

    fn photo_sink(&self) -> Result<MfPhotoSink, CaptureError> {
        let sink = self.sink(MF_CAPTURE_ENGINE_SINK_TYPE_PHOTO, "QI photo sink")?;
        Ok(MfPhotoSink { sink })
    }

    fn start_preview(&mut self) -> Result<(), CaptureError> {
        self.require_initialized("StartPreview")?;
        unsafe { self.engine.StartPreview() }.map_err(step_failed("StartPreview"))?;
        self.previewing = true;
        Ok(())
    }

    fn take_photo(&mut self) -> Result<(), CaptureError> {
        self.require_initialized("TakePhoto")?;
        unsafe { self.engine.TakePhoto() }.map_err(step_failed("TakePhoto"))
    }
}

impl Drop for MfCaptureEngine {
    fn drop(&mut self) {
        if self.previewing {
            if let Err(e) = unsafe { self.engine.StopPreview() } {
                log::warn!("StopPreview failed: {}", e);
            }
        }
    }
}

pub struct MfCaptureSource {
    source: IMFCaptureSource,
}

// SAFETY: See `MfCaptureEngine`.
unsafe impl Send for MfCaptureSource {}
unsafe impl Sync for MfCaptureSource {}

impl CaptureSource for MfCaptureSource {
    fn current_media_format(&self, role: StreamRole) -> Result<MediaFormat, CaptureError> {
        let media_type = unsafe { self.source.GetCurrentDeviceMediaType(source_stream(role)) }
            .map_err(step_failed("GetCurrentDeviceMediaType"))?;
        from_media_type(&media_type)
    }
}

pub struct MfPreviewSink {
    sink: IMFCapturePreviewSink,
}

// SAFETY: See `MfCaptureEngine`.
unsafe impl Send for MfPreviewSink {}
unsafe impl Sync for MfPreviewSink {}

impl PreviewSink for MfPreviewSink {
    fn add_stream(&self, role: StreamRole, format: &MediaFormat) -> Result<u32, CaptureError> {
        let media_type = to_media_type(format)?;
        let mut sink_stream: u32 = 0;
        unsafe {
            self.sink
                .AddStream(
                    source_stream(role),
                    &media_type,
                    None::<&IMFAttributes>,
                    Some(&mut sink_stream as *mut u32),
                )
                .map_err(format_rejected(format!("preview sink refused {format}")))?;
        }
        Ok(sink_stream)
    }

    fn set_sample_callback(
        &self,
        stream_index: u32,
        callback: Arc<dyn SampleCallback>,
    ) -> Result<(), CaptureError> {
        let forwarder: IMFCaptureEngineOnSampleCallback =
            SampleForwarder::new(stream_index, callback).into();
        unsafe { self.sink.SetSampleCallback(stream_index, &forwarder) }
            .map_err(step_failed("SetSampleCallback"))
    }
}

pub struct MfPhotoSink {
    sink: IMFCapturePhotoSink,
}

// SAFETY: See `MfCaptureEngine`.
unsafe impl Send for MfPhotoSink {}
unsafe impl Sync for MfPhotoSink {}

impl PhotoSink for MfPhotoSink {
    fn remove_all_streams(&self) -> Result<(), CaptureError> {
        unsafe { self.sink.RemoveAllStreams() }.map_err(step_failed("RemoveAllStreams"))
    }

    fn add_stream(&self, role: StreamRole, format: &MediaFormat) -> Result<u32, CaptureError> {
        let media_type = to_media_type(format)?;
        let mut sink_stream: u32 = 0;
        unsafe {
            self.sink
                .AddStream(
                    source_stream(role),
                    &media_type,
                    None::<&IMFAttributes>,
                    Some(&mut sink_stream as *mut u32),
                )
                .map_err(format_rejected(format!("photo sink refused {format}")))?;
        }
        Ok(sink_stream)
    }

    fn set_output_file(&self, path: &Path) -> Result<(), CaptureError> {
        unsafe { self.sink.SetOutputFileName(&HSTRING::from(path)) }
            .map_err(step_failed("SetOutputFileName"))
    }
}
