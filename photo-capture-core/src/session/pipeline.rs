use std::sync::Arc;

use crate::binding::sink_binder::{bind_photo, bind_preview};
use crate::models::config::PhotoConfiguration;
use crate::models::device::StreamRole;
use crate::models::error::CaptureError;
use crate::models::media_format::MediaFormat;
use crate::models::photo_result::{PhotoMetadata, PhotoResult};
use crate::models::state::{PipelineState, PipelineStep};
use crate::negotiation::media_type::{
    derive_compatible_photo_format, derive_compatible_video_format, PREVIEW_SUBTYPE,
};
use crate::registry::device_registry::DeviceRegistry;
use crate::session::event_signal::EventSignal;
use crate::session::frame_counter::FrameCounter;
use crate::storage::metadata::write_metadata;
use crate::storage::photo_file::digest_photo;
use crate::traits::callbacks::{EngineEventKind, EventCallback, SampleCallback};
use crate::traits::capture_engine::{CaptureEngine, CaptureSource, PhotoSink};
use crate::traits::device_provider::DeviceProvider;
use crate::traits::pipeline_delegate::PipelineDelegate;

/// Drives a capture engine from "uninitialized" to "photo written to disk".
///
/// The controller exclusively owns the engine (and through it the source and
/// both sinks) for the run. It is driven synchronously from one thread; the
/// engine reports completion of asynchronous requests through an
/// [`EventSignal`] the controller blocks on with a bounded timeout.
///
/// ```text
/// activate source → start preview → await stability → take photo
///   (Initialized)    (PreviewStarted    (fixed hold,     (PhotoTaken)
///                     + settle hold)     fails on error)
/// ```
///
/// The first failing step moves the pipeline to `Failed` and its cause is
/// returned unchanged. Nothing is retried.
pub struct PipelineController<E: CaptureEngine> {
    engine: E,
    config: PhotoConfiguration,
    state: PipelineState,
    events: Arc<EventSignal>,
    samples: Arc<dyn SampleCallback>,
    delegate: Option<Arc<dyn PipelineDelegate>>,
    device_name: Option<String>,
    preview_stream: Option<u32>,
}

impl<E: CaptureEngine> PipelineController<E> {
    /// Create a controller for `engine`. Fails with `InvalidArgument` if the
    /// configuration does not validate.
    pub fn new(engine: E, config: PhotoConfiguration) -> Result<Self, CaptureError> {
        config.validate().map_err(CaptureError::InvalidArgument)?;

        Ok(Self {
            engine,
            config,
            state: PipelineState::Uninitialized,
            events: Arc::new(EventSignal::new()),
            samples: Arc::new(FrameCounter::new()),
            delegate: None,
            device_name: None,
            preview_stream: None,
        })
    }

    /// Replace the default frame-discarding sample callback.
    pub fn with_sample_callback(mut self, callback: Arc<dyn SampleCallback>) -> Self {
        self.samples = callback;
        self
    }

    pub fn set_delegate(&mut self, delegate: Arc<dyn PipelineDelegate>) {
        self.delegate = Some(delegate);
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    pub fn config(&self) -> &PhotoConfiguration {
        &self.config
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The event callback shared with the engine.
    pub fn events(&self) -> &Arc<EventSignal> {
        &self.events
    }

    /// Sink stream index the sample callback is attached to, once preview is bound.
    pub fn preview_stream(&self) -> Option<u32> {
        self.preview_stream
    }

    /// Run every step straight through and return the written photo.
    ///
    /// The registry is only consulted when the configuration selects a device
    /// by index; otherwise the engine binds the system default device.
    pub fn run<P>(&mut self, registry: &DeviceRegistry<P>) -> Result<PhotoResult, CaptureError>
    where
        P: DeviceProvider<Device = E::Device>,
    {
        self.activate_device(registry)?;
        self.start_preview()?;
        self.await_stability()?;
        self.take_photo()
    }

    /// Uninitialized → SourceBound, selecting the device by the configured index.
    ///
    /// A bad index fails at `SelectDevice`; a device that cannot be activated
    /// fails at `ActivateSource`.
    pub fn activate_device<P>(&mut self, registry: &DeviceRegistry<P>) -> Result<(), CaptureError>
    where
        P: DeviceProvider<Device = E::Device>,
    {
        self.require("activate source", |s| matches!(s, PipelineState::Uninitialized))?;

        let device = match self.config.device_index {
            Some(index) => {
                let descriptor = registry
                    .select(index)
                    .map_err(|e| self.fail(PipelineStep::SelectDevice, e))?;
                self.device_name = Some(descriptor.name.clone());
                let device = registry
                    .activate(descriptor)
                    .map_err(|e| self.fail(PipelineStep::ActivateSource, e))?;
                Some(device)
            }
            None => None,
        };
        self.attach_source(device)
    }

    /// Uninitialized → SourceBound with a caller-supplied device, or the
    /// system default device when None.
    pub fn attach_source(&mut self, device: Option<E::Device>) -> Result<(), CaptureError> {
        self.require("activate source", |s| matches!(s, PipelineState::Uninitialized))?;

        log::info!("Initializing camera...");
        self.run_step(PipelineStep::ActivateSource, |this| {
            let events: Arc<dyn EventCallback> = this.events.clone();
            this.engine.initialize(events, device)?;
            this.events
                .wait_for(&EngineEventKind::Initialized, "Initialize", this.config.event_timeout)?;
            Ok(())
        })?;

        self.set_state(PipelineState::SourceBound);
        Ok(())
    }

    /// SourceBound → PreviewActive.
    ///
    /// Negotiates an RGB32 preview format from the source's preview stream,
    /// binds it with the sample callback, starts the preview and waits for the
    /// engine to report it started plus the settle delay.
    pub fn start_preview(&mut self) -> Result<(), CaptureError> {
        self.require("start preview", |s| matches!(s, PipelineState::SourceBound))?;

        self.run_step(PipelineStep::StartPreview, |this| {
            let source = this.engine.source()?;
            let native = source.current_media_format(StreamRole::Preview)?;
            let format = MediaFormat::Video(derive_compatible_video_format(&native, PREVIEW_SUBTYPE));

            let sink = this.engine.preview_sink()?;
            let stream = bind_preview(&sink, StreamRole::Preview, &format, Arc::clone(&this.samples))?;
            this.preview_stream = Some(stream);

            this.engine.start_preview()?;
            this.events
                .wait_for(&EngineEventKind::PreviewStarted, "StartPreview", this.config.event_timeout)?;

            this.events.hold("StartPreview", this.config.preview_settle)?;
            log::info!("preview streaming {format}");
            Ok(())
        })?;

        self.set_state(PipelineState::PreviewActive);
        Ok(())
    }

    /// Let exposure, white balance and focus settle for the configured duration.
    ///
    /// Blocks the controller thread and leaves the state unchanged, unless the
    /// engine reports an error meanwhile, which fails the `AwaitStability` step.
    pub fn await_stability(&mut self) -> Result<(), CaptureError> {
        self.require("await stability", PipelineState::is_preview_active)?;

        log::info!(
            "Stabilizing video stream for {} ms...",
            self.config.stabilization.as_millis()
        );
        self.run_step(PipelineStep::AwaitStability, |this| {
            this.events.hold("AwaitStability", this.config.stabilization)
        })
    }

    /// PreviewActive → CapturingPhoto → PhotoComplete.
    ///
    /// May be called again from PhotoComplete while the preview keeps running;
    /// the photo sink is cleared before every bind.
    pub fn take_photo(&mut self) -> Result<PhotoResult, CaptureError> {
        self.require("take photo", |s| s.is_preview_active() || s.is_complete())?;

        log::info!("Taking photo...");
        self.set_state(PipelineState::CapturingPhoto);
        let result = self.run_step(PipelineStep::TakePhoto, Self::capture_still)?;

        log::info!(
            "Done taking photo: {} ({} bytes)",
            result.file_path.display(),
            result.size_bytes
        );
        self.set_state(PipelineState::PhotoComplete(Box::new(result.clone())));
        Ok(result)
    }

    fn capture_still(&mut self) -> Result<PhotoResult, CaptureError> {
        let source = self.engine.source()?;
        let native = source.current_media_format(StreamRole::Photo)?;
        let format = derive_compatible_photo_format(&native, self.config.photo_size)?;

        let sink = self.engine.photo_sink()?;
        bind_photo(&sink, StreamRole::Photo, &MediaFormat::Image(format.clone()))?;
        sink.set_output_file(&self.config.output_path)?;

        self.engine.take_photo()?;
        self.events
            .wait_for(&EngineEventKind::PhotoTaken, "TakePhoto", self.config.event_timeout)?;

        let path = self.config.output_path.clone();
        let digest = digest_photo(&path)?;
        let metadata = PhotoMetadata::new(
            &path.to_string_lossy(),
            self.device_name.clone(),
            &format,
            digest.size_bytes,
            &digest.checksum,
        );
        if self.config.write_metadata {
            write_metadata(&metadata, &path)?;
        }

        Ok(PhotoResult {
            file_path: path,
            format,
            size_bytes: digest.size_bytes,
            checksum: digest.checksum,
            metadata,
        })
    }

    // --- Internal helpers ---

    /// Reject calls made from the wrong state without changing it.
    fn require(
        &self,
        operation: &str,
        allowed: impl FnOnce(&PipelineState) -> bool,
    ) -> Result<(), CaptureError> {
        if let Some((step, error)) = self.state.failure() {
            return Err(CaptureError::InvalidArgument(format!(
                "cannot {operation}: pipeline failed at {step} ({error})"
            )));
        }
        if !allowed(&self.state) {
            return Err(CaptureError::InvalidArgument(format!(
                "cannot {operation} while {}",
                self.state
            )));
        }
        Ok(())
    }

    fn run_step<T>(
        &mut self,
        step: PipelineStep,
        body: impl FnOnce(&mut Self) -> Result<T, CaptureError>,
    ) -> Result<T, CaptureError> {
        body(self).map_err(|error| self.fail(step, error))
    }

    /// Move to `Failed` and hand the cause back for propagation.
    fn fail(&mut self, step: PipelineStep, error: CaptureError) -> CaptureError {
        log::error!("failed {step}: {error}");
        if let Some(ref delegate) = self.delegate {
            delegate.on_error(step, &error);
        }
        self.set_state(PipelineState::Failed {
            step,
            error: error.clone(),
        });
        error
    }

    fn set_state(&mut self, new_state: PipelineState) {
        log::debug!("pipeline {} → {}", self.state.name(), new_state.name());
        self.state = new_state;
        if let Some(ref delegate) = self.delegate {
            delegate.on_state_changed(&self.state);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;
    use std::time::Duration;

    use parking_lot::Mutex;

    use super::*;
    use crate::models::error::PlatformStatus;
    use crate::models::media_format::FrameSize;
    use crate::virtual_camera::{VirtualBehavior, VirtualCamera, VirtualDeviceProvider, VirtualEngine};

    fn temp_photo_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("photo_capture_test_{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join(name)
    }

    fn fast_config(name: &str) -> PhotoConfiguration {
        PhotoConfiguration {
            stabilization: Duration::ZERO,
            preview_settle: Duration::ZERO,
            event_timeout: Duration::from_secs(5),
            output_path: temp_photo_path(name),
            ..Default::default()
        }
    }

    fn controller_for(
        provider: &VirtualDeviceProvider,
        config: PhotoConfiguration,
    ) -> PipelineController<VirtualEngine> {
        PipelineController::new(VirtualEngine::new(provider.clone()), config).unwrap()
    }

    #[derive(Default)]
    struct StateLog {
        states: Mutex<Vec<&'static str>>,
        errors: Mutex<Vec<PipelineStep>>,
    }

    impl PipelineDelegate for StateLog {
        fn on_state_changed(&self, state: &PipelineState) {
            self.states.lock().push(state.name());
        }

        fn on_error(&self, step: PipelineStep, _error: &CaptureError) {
            self.errors.lock().push(step);
        }
    }

    #[test]
    fn invalid_configuration_is_rejected_up_front() {
        let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("Cam")]);
        let config = PhotoConfiguration::default().with_photo_size(0, 480);
        let err = PipelineController::new(VirtualEngine::new(provider), config).err().unwrap();
        assert!(matches!(err, CaptureError::InvalidArgument(_)));
    }

    #[test]
    fn transitions_are_reported_in_order() {
        let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("Cam")]);
        let registry = DeviceRegistry::new(provider.clone());
        let config = fast_config("ordered.jpg");
        let path = config.output_path.clone();

        let log = Arc::new(StateLog::default());
        let mut controller = controller_for(&provider, config);
        controller.set_delegate(log.clone());

        controller.run(&registry).unwrap();

        assert_eq!(
            *log.states.lock(),
            vec!["source bound", "preview active", "capturing photo", "photo complete"]
        );
        assert!(log.errors.lock().is_empty());
        assert!(controller.preview_stream().is_some());
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn out_of_order_calls_do_not_change_state() {
        let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("Cam")]);
        let mut controller = controller_for(&provider, fast_config("order.jpg"));

        assert!(matches!(controller.start_preview(), Err(CaptureError::InvalidArgument(_))));
        assert!(matches!(controller.take_photo(), Err(CaptureError::InvalidArgument(_))));
        assert!(matches!(controller.await_stability(), Err(CaptureError::InvalidArgument(_))));
        assert_eq!(*controller.state(), PipelineState::Uninitialized);

        controller.attach_source(None).unwrap();
        assert!(matches!(controller.attach_source(None), Err(CaptureError::InvalidArgument(_))));
        assert_eq!(*controller.state(), PipelineState::SourceBound);
    }

    #[test]
    fn failure_is_terminal_and_keeps_the_cause() {
        let camera = VirtualCamera::vga("Cam").with_behavior(VirtualBehavior {
            reject_preview_format: true,
            ..Default::default()
        });
        let provider = VirtualDeviceProvider::with_cameras(vec![camera]);
        let mut controller = controller_for(&provider, fast_config("failed.jpg"));

        controller.attach_source(None).unwrap();
        let err = controller.start_preview().unwrap_err();
        assert!(matches!(err, CaptureError::FormatRejected { .. }));

        let (step, cause) = controller.state().failure().unwrap();
        assert_eq!(step, PipelineStep::StartPreview);
        assert_eq!(cause, &err);

        // Every further call is refused and the failure is preserved.
        assert!(matches!(controller.take_photo(), Err(CaptureError::InvalidArgument(_))));
        assert_eq!(controller.state().failure().unwrap().0, PipelineStep::StartPreview);
    }

    #[test]
    fn missing_default_device_fails_activation() {
        let provider = VirtualDeviceProvider::with_cameras(vec![]);
        let mut controller = controller_for(&provider, fast_config("none.jpg"));

        let err = controller.attach_source(None).unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
        assert_eq!(controller.state().failure().unwrap().0, PipelineStep::ActivateSource);
    }

    #[test]
    fn bad_device_index_fails_at_selection() {
        let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("Cam")]);
        let registry = DeviceRegistry::new(provider.clone());
        let config = PhotoConfiguration {
            device_index: Some(4),
            ..fast_config("index.jpg")
        };
        let mut controller = controller_for(&provider, config);

        let err = controller.run(&registry).unwrap_err();
        assert!(matches!(err, CaptureError::InvalidArgument(_)));
        assert_eq!(controller.state().failure().unwrap().0, PipelineStep::SelectDevice);
        assert_eq!(provider.activation_count(), 0);
    }

    #[test]
    fn held_device_fails_at_activation_not_selection() {
        let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("Cam")]);
        let registry = DeviceRegistry::new(provider.clone());
        let _held = provider.activate_default().unwrap();
        let config = PhotoConfiguration {
            device_index: Some(0),
            ..fast_config("held.jpg")
        };
        let mut controller = controller_for(&provider, config);

        let err = controller.run(&registry).unwrap_err();
        assert!(matches!(err, CaptureError::DeviceUnavailable(_)));
        assert_eq!(controller.state().failure().unwrap().0, PipelineStep::ActivateSource);
    }

    #[test]
    fn preview_error_during_stabilization_fails_that_step() {
        let status = PlatformStatus(0xC00D_3EA3_u32 as i32);
        let camera = VirtualCamera::vga("Cam").with_behavior(VirtualBehavior {
            preview_error: Some((3, status)),
            ..Default::default()
        });
        let provider = VirtualDeviceProvider::with_cameras(vec![camera]);
        let config = PhotoConfiguration {
            stabilization: Duration::from_secs(5),
            ..fast_config("unstable.jpg")
        };
        let path = config.output_path.clone();
        let log = Arc::new(StateLog::default());
        let mut controller = controller_for(&provider, config);
        controller.set_delegate(log.clone());

        controller.attach_source(None).unwrap();
        controller.start_preview().unwrap();
        let err = controller.await_stability().unwrap_err();

        assert_eq!(err, CaptureError::step_failed("AwaitStability", status));
        assert_eq!(controller.state().failure().unwrap().0, PipelineStep::AwaitStability);
        assert_eq!(*log.errors.lock(), vec![PipelineStep::AwaitStability]);
        assert!(matches!(controller.take_photo(), Err(CaptureError::InvalidArgument(_))));
        assert!(!path.exists());
    }

    #[test]
    fn missing_completion_event_times_out() {
        let camera = VirtualCamera::vga("Cam").with_behavior(VirtualBehavior {
            emit_photo_taken: false,
            ..Default::default()
        });
        let provider = VirtualDeviceProvider::with_cameras(vec![camera]);
        let config = PhotoConfiguration {
            event_timeout: Duration::from_millis(100),
            ..fast_config("silent.jpg")
        };
        let mut controller = controller_for(&provider, config);

        controller.attach_source(None).unwrap();
        controller.start_preview().unwrap();
        let err = controller.take_photo().unwrap_err();
        assert!(matches!(err, CaptureError::Timeout(_)));
        assert_eq!(controller.state().failure().unwrap().0, PipelineStep::TakePhoto);
    }

    #[test]
    fn engine_error_event_fails_photo_with_its_status() {
        let status = PlatformStatus(0xC00D_3E86_u32 as i32);
        let camera = VirtualCamera::vga("Cam").with_behavior(VirtualBehavior {
            photo_error: Some(status),
            ..Default::default()
        });
        let provider = VirtualDeviceProvider::with_cameras(vec![camera]);
        let config = fast_config("error.jpg");
        let path = config.output_path.clone();
        let mut controller = controller_for(&provider, config);

        controller.attach_source(None).unwrap();
        controller.start_preview().unwrap();
        let err = controller.take_photo().unwrap_err();

        assert_eq!(err.status(), status);
        assert!(!path.exists());
    }

    #[test]
    fn photo_can_be_retaken_while_preview_runs() {
        let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("Cam")]);
        let mut config = fast_config("first.jpg");
        config.photo_size = Some(FrameSize::new(320, 240));
        let mut controller = controller_for(&provider, config);

        controller.attach_source(None).unwrap();
        controller.start_preview().unwrap();
        let first = controller.take_photo().unwrap();
        let second = controller.take_photo().unwrap();

        assert!(controller.state().is_complete());
        assert_eq!(first.format, second.format);
        assert_eq!(controller.engine().photo_stream_count(), 1);
        std::fs::remove_dir_all(first.file_path.parent().unwrap()).ok();
    }

    #[test]
    fn preview_frames_reach_the_sample_callback() {
        let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("Cam")]);
        let counter = Arc::new(FrameCounter::new());
        let config = PhotoConfiguration {
            stabilization: Duration::from_millis(200),
            ..fast_config("frames.jpg")
        };
        let mut controller =
            controller_for(&provider, config).with_sample_callback(counter.clone());

        controller.attach_source(None).unwrap();
        controller.start_preview().unwrap();
        controller.await_stability().unwrap();

        assert!(counter.frames() > 0);
        assert!(controller.events().received() >= 2);
    }
}
