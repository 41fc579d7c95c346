use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::models::device::StreamRole;
use crate::models::error::{CaptureError, PlatformStatus};
use crate::models::media_format::{FrameSize, ImageFormat, MediaFormat, VideoFormat};
use crate::traits::callbacks::{
    EngineEvent, EngineEventKind, EventCallback, PreviewFrame, SampleCallback,
};
use crate::traits::capture_engine::{CaptureEngine, CaptureSource, PhotoSink, PreviewSink};
use crate::virtual_camera::device::{VirtualCamera, VirtualDevice, VirtualDeviceProvider};
use crate::virtual_camera::render;

const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(33);
/// Largest width or height a baseline JPEG can describe.
pub const MAX_JPEG_DIMENSION: u32 = 65_535;

#[derive(Default)]
struct PreviewBinding {
    streams: Vec<VideoFormat>,
    callbacks: Vec<(u32, Arc<dyn SampleCallback>)>,
}

#[derive(Default)]
struct PhotoBinding {
    streams: Vec<ImageFormat>,
    output: Option<PathBuf>,
}

/// State shared between the engine, its source/sink handles and its threads.
#[derive(Default)]
struct EngineShared {
    device: Mutex<Option<VirtualDevice>>,
    events: Mutex<Option<Arc<dyn EventCallback>>>,
    preview: Mutex<PreviewBinding>,
    photo: Mutex<PhotoBinding>,
}

impl EngineShared {
    fn camera(&self, operation: &str) -> Result<VirtualCamera, CaptureError> {
        self.device
            .lock()
            .as_ref()
            .map(|device| device.camera().clone())
            .ok_or_else(|| CaptureError::step_failed(operation, PlatformStatus::NOT_INITIALIZED))
    }

    fn emit(&self, kind: EngineEventKind, status: PlatformStatus) {
        let callback = self.events.lock().clone();
        if let Some(callback) = callback {
            callback.on_event(&EngineEvent::new(kind, status));
        }
    }
}

/// In-process capture engine over a [`VirtualDevice`].
///
/// Events and preview frames are delivered from engine-owned threads, as a
/// platform engine does. Threads are stopped and joined on drop, which also
/// releases the device.
pub struct VirtualEngine {
    provider: VirtualDeviceProvider,
    shared: Arc<EngineShared>,
    running: Arc<AtomicBool>,
    frame_thread: Option<thread::JoinHandle<()>>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl VirtualEngine {
    /// Engine that falls back to the first camera of `provider` when
    /// initialized without a device.
    pub fn new(provider: VirtualDeviceProvider) -> Self {
        Self {
            provider,
            shared: Arc::new(EngineShared::default()),
            running: Arc::new(AtomicBool::new(false)),
            frame_thread: None,
            workers: Vec::new(),
        }
    }

    /// Streams currently bound to the photo sink.
    pub fn photo_stream_count(&self) -> usize {
        self.shared.photo.lock().streams.len()
    }

    fn spawn_worker(
        &mut self,
        name: &str,
        work: impl FnOnce(Arc<EngineShared>) + Send + 'static,
    ) -> Result<(), CaptureError> {
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(name.into())
            .spawn(move || work(shared))
            .map_err(|e| CaptureError::StorageError(format!("failed to spawn {name} thread: {}", e)))?;
        self.workers.push(handle);
        Ok(())
    }
}

impl CaptureEngine for VirtualEngine {
    type Device = VirtualDevice;
    type Source = VirtualSource;
    type Preview = VirtualPreviewSink;
    type Photo = VirtualPhotoSink;

    fn initialize(
        &mut self,
        events: Arc<dyn EventCallback>,
        device: Option<VirtualDevice>,
    ) -> Result<(), CaptureError> {
        if self.shared.device.lock().is_some() {
            return Err(CaptureError::step_failed("Initialize", PlatformStatus::INVALID_REQUEST));
        }

        let device = match device {
            Some(device) => device,
            None => self.provider.activate_default()?,
        };
        let announce = device.camera().behavior.emit_initialized;
        log::debug!("virtual engine bound to {}", device.camera().name);

        *self.shared.events.lock() = Some(events);
        *self.shared.device.lock() = Some(device);

        if announce {
            self.spawn_worker("virtual-engine-init", |shared| {
                shared.emit(EngineEventKind::Initialized, PlatformStatus::OK);
            })?;
        }
        Ok(())
    }

    fn source(&self) -> Result<VirtualSource, CaptureError> {
        self.shared.camera("GetSource")?;
        Ok(VirtualSource {
            shared: Arc::clone(&self.shared),
        })
    }

    fn preview_sink(&self) -> Result<VirtualPreviewSink, CaptureError> {
        self.shared.camera("GetSink")?;
        Ok(VirtualPreviewSink {
            shared: Arc::clone(&self.shared),
        })
    }

    fn photo_sink(&self) -> Result<VirtualPhotoSink, CaptureError> {
        self.shared.camera("GetSink")?;
        Ok(VirtualPhotoSink {
            shared: Arc::clone(&self.shared),
        })
    }

    fn start_preview(&mut self) -> Result<(), CaptureError> {
        let camera = self.shared.camera("StartPreview")?;
        let format = self
            .shared
            .preview
            .lock()
            .streams
            .last()
            .cloned()
            .ok_or_else(|| CaptureError::step_failed("StartPreview", PlatformStatus::INVALID_REQUEST))?;
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(CaptureError::step_failed("StartPreview", PlatformStatus::INVALID_REQUEST));
        }

        let size = format
            .frame_size
            .or(camera.preview.frame_size)
            .unwrap_or(FrameSize::new(640, 480));
        let interval = format
            .frame_rate
            .filter(|rate| rate.numerator > 0 && rate.denominator > 0)
            .and_then(|rate| Duration::try_from_secs_f64(1.0 / rate.as_f64()).ok())
            .unwrap_or(DEFAULT_FRAME_INTERVAL);
        let announce = camera.behavior.emit_preview_started;
        let preview_error = camera.behavior.preview_error;

        let shared = Arc::clone(&self.shared);
        let running = Arc::clone(&self.running);
        let handle = thread::Builder::new()
            .name("virtual-preview".into())
            .spawn(move || {
                let frame = render::rgb32_pattern(size);
                let started = Instant::now();
                if announce {
                    shared.emit(EngineEventKind::PreviewStarted, PlatformStatus::OK);
                }

                let mut delivered: u32 = 0;
                while running.load(Ordering::SeqCst) {
                    thread::sleep(interval);
                    delivered += 1;
                    if let Some((after, status)) = preview_error {
                        if delivered == after {
                            shared.emit(EngineEventKind::Error, status);
                        }
                    }

                    let callbacks = shared.preview.lock().callbacks.clone();
                    for (stream_index, callback) in callbacks {
                        callback.on_sample(&PreviewFrame {
                            stream_index,
                            timestamp: Some(started.elapsed()),
                            data: &frame,
                        });
                    }
                }

                shared.emit(EngineEventKind::PreviewStopped, PlatformStatus::OK);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CaptureError::StorageError(format!("failed to spawn preview thread: {}", e))
            })?;

        self.frame_thread = Some(handle);
        Ok(())
    }

    fn take_photo(&mut self) -> Result<(), CaptureError> {
        let camera = self.shared.camera("TakePhoto")?;
        let (format, output) = {
            let photo = self.shared.photo.lock();
            match (photo.streams.last(), &photo.output) {
                (Some(format), Some(output)) => (format.clone(), output.clone()),
                _ => {
                    return Err(CaptureError::step_failed(
                        "TakePhoto",
                        PlatformStatus::INVALID_REQUEST,
                    ))
                }
            }
        };

        let size = format
            .frame_size
            .or(camera.photo.frame_size())
            .ok_or(CaptureError::AttributeUnavailable("frame size"))?;
        let behavior = camera.behavior;

        self.spawn_worker("virtual-photo", move |shared| {
            if !behavior.encode_delay.is_zero() {
                thread::sleep(behavior.encode_delay);
            }
            if let Some(status) = behavior.photo_error {
                shared.emit(EngineEventKind::Error, status);
                return;
            }

            match render::write_jpeg(&output, size) {
                Ok(()) if behavior.emit_photo_taken => {
                    shared.emit(EngineEventKind::PhotoTaken, PlatformStatus::OK);
                }
                Ok(()) => {}
                Err(e) => {
                    log::error!("virtual photo encode failed: {}", e);
                    shared.emit(EngineEventKind::Error, e.status());
                }
            }
        })
    }
}

impl Drop for VirtualEngine {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.frame_thread.take() {
            let _ = handle.join();
        }
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

/// Source handle of a [`VirtualEngine`].
pub struct VirtualSource {
    shared: Arc<EngineShared>,
}

impl CaptureSource for VirtualSource {
    fn current_media_format(&self, role: StreamRole) -> Result<MediaFormat, CaptureError> {
        let camera = self.shared.camera("GetCurrentDeviceMediaType")?;
        Ok(match role {
            StreamRole::Preview => MediaFormat::Video(camera.preview),
            StreamRole::Photo => camera.photo,
        })
    }
}

/// Preview sink handle of a [`VirtualEngine`]. Accepts uncompressed RGB only.
pub struct VirtualPreviewSink {
    shared: Arc<EngineShared>,
}

impl PreviewSink for VirtualPreviewSink {
    fn add_stream(&self, _role: StreamRole, format: &MediaFormat) -> Result<u32, CaptureError> {
        let camera = self.shared.camera("AddStream")?;
        let video = match format {
            MediaFormat::Video(video)
                if video.subtype.is_uncompressed_rgb() && !camera.behavior.reject_preview_format =>
            {
                video
            }
            _ => {
                return Err(CaptureError::FormatRejected {
                    reason: format!("{} cannot preview {format}", camera.name),
                    status: PlatformStatus::INVALID_MEDIA_TYPE,
                })
            }
        };

        let mut preview = self.shared.preview.lock();
        preview.streams.push(video.clone());
        Ok(preview.streams.len() as u32 - 1)
    }

    fn set_sample_callback(
        &self,
        stream_index: u32,
        callback: Arc<dyn SampleCallback>,
    ) -> Result<(), CaptureError> {
        let mut preview = self.shared.preview.lock();
        if stream_index as usize >= preview.streams.len() {
            return Err(CaptureError::InvalidArgument(format!(
                "no preview stream {stream_index}"
            )));
        }
        preview.callbacks.retain(|(index, _)| *index != stream_index);
        preview.callbacks.push((stream_index, callback));
        Ok(())
    }
}

/// Photo sink handle of a [`VirtualEngine`].
pub struct VirtualPhotoSink {
    shared: Arc<EngineShared>,
}

impl PhotoSink for VirtualPhotoSink {
    fn remove_all_streams(&self) -> Result<(), CaptureError> {
        self.shared.photo.lock().streams.clear();
        Ok(())
    }

    fn add_stream(&self, _role: StreamRole, format: &MediaFormat) -> Result<u32, CaptureError> {
        let camera = self.shared.camera("AddStream")?;
        let image = format.as_image().ok_or_else(|| CaptureError::FormatRejected {
            reason: format!("photo sink cannot take {format}"),
            status: PlatformStatus::INVALID_MEDIA_TYPE,
        })?;

        if let Some(requested) = image.frame_size {
            if requested.width > MAX_JPEG_DIMENSION || requested.height > MAX_JPEG_DIMENSION {
                return Err(CaptureError::FormatRejected {
                    reason: format!("{requested} exceeds the JPEG limit of {MAX_JPEG_DIMENSION} per side"),
                    status: PlatformStatus::INVALID_MEDIA_TYPE,
                });
            }
        }
        if let (Some(max), Some(requested)) = (camera.behavior.max_photo_size, image.frame_size) {
            if requested.width > max.width || requested.height > max.height {
                return Err(CaptureError::FormatRejected {
                    reason: format!("{} supports stills up to {max}, requested {requested}", camera.name),
                    status: PlatformStatus::INVALID_MEDIA_TYPE,
                });
            }
        }

        let mut photo = self.shared.photo.lock();
        photo.streams.push(image.clone());
        Ok(photo.streams.len() as u32 - 1)
    }

    fn set_output_file(&self, path: &Path) -> Result<(), CaptureError> {
        self.shared.photo.lock().output = Some(path.to_path_buf());
        Ok(())
    }
}
