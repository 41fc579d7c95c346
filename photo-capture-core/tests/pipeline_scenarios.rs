//! End-to-end capture runs against virtual cameras.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use photo_capture_core::storage::metadata::read_metadata;
use photo_capture_core::virtual_camera::{
    VirtualBehavior, VirtualCamera, VirtualDeviceProvider, VirtualEngine,
};
use photo_capture_core::{
    CaptureError, DeviceProvider, DeviceRegistry, FrameSize, PhotoConfiguration, PipelineController,
    PipelineState, PipelineStep, PlatformStatus, Ratio,
};

struct TempDir(PathBuf);

impl TempDir {
    fn new() -> Self {
        let dir = std::env::temp_dir().join(format!("photo_capture_it_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        Self(dir)
    }

    fn join(&self, name: &str) -> PathBuf {
        self.0.join(name)
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        fs::remove_dir_all(&self.0).ok();
    }
}

/// Defaults as the command line would pass them, minus the real-time waits.
fn quick(config: PhotoConfiguration) -> PhotoConfiguration {
    PhotoConfiguration {
        stabilization: Duration::from_millis(50),
        preview_settle: Duration::ZERO,
        event_timeout: Duration::from_secs(10),
        ..config
    }
}

fn run(
    provider: &VirtualDeviceProvider,
    config: PhotoConfiguration,
) -> (PipelineController<VirtualEngine>, Result<photo_capture_core::PhotoResult, CaptureError>) {
    let registry = DeviceRegistry::new(provider.clone());
    let mut controller =
        PipelineController::new(VirtualEngine::new(provider.clone()), config).unwrap();
    let result = controller.run(&registry);
    (controller, result)
}

#[test]
fn enumerating_a_system_without_cameras_is_clean() {
    let registry = DeviceRegistry::new(VirtualDeviceProvider::default());
    let devices = registry.enumerate().unwrap();
    assert!(devices.is_empty());
}

#[test]
fn default_run_writes_native_size_photo() {
    let dir = TempDir::new();
    let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::hd("Front Camera")]);
    let config = quick(PhotoConfiguration {
        output_path: dir.join("photo.jpg"),
        ..Default::default()
    });

    let (controller, result) = run(&provider, config);
    let photo = result.unwrap();

    assert!(controller.state().is_complete());
    assert!(photo.file_path.exists());
    assert_eq!(photo.format.frame_size, Some(FrameSize::new(1920, 1080)));
    assert_eq!(image::image_dimensions(&photo.file_path).unwrap(), (1920, 1080));
    assert_eq!(photo.size_bytes, fs::metadata(&photo.file_path).unwrap().len());
    assert_eq!(photo.checksum.len(), 64);
}

#[test]
fn explicit_size_overrides_preview_resolution() {
    let dir = TempDir::new();
    let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("USB Camera")]);
    let config = quick(PhotoConfiguration {
        output_path: dir.join("sized.jpg"),
        ..Default::default()
    })
    .with_photo_size(1280, 720);

    let (_, result) = run(&provider, config);
    let photo = result.unwrap();

    assert_eq!(image::image_dimensions(&photo.file_path).unwrap(), (1280, 720));
}

#[test]
fn rejected_preview_format_fails_before_any_photo() {
    let dir = TempDir::new();
    let camera = VirtualCamera::hd("Picky Camera").with_behavior(VirtualBehavior {
        reject_preview_format: true,
        ..Default::default()
    });
    let provider = VirtualDeviceProvider::with_cameras(vec![camera]);
    let output = dir.join("never.jpg");
    let config = quick(PhotoConfiguration {
        output_path: output.clone(),
        ..Default::default()
    });

    let (controller, result) = run(&provider, config);

    assert!(matches!(result, Err(CaptureError::FormatRejected { .. })));
    match controller.state() {
        PipelineState::Failed { step, .. } => assert_eq!(*step, PipelineStep::StartPreview),
        other => panic!("expected failed state, got {other}"),
    }
    assert_eq!(controller.engine().photo_stream_count(), 0);
    assert!(!output.exists());
}

#[test]
fn existing_file_is_untouched_when_preview_fails() {
    let dir = TempDir::new();
    let camera = VirtualCamera::hd("Picky Camera").with_behavior(VirtualBehavior {
        reject_preview_format: true,
        ..Default::default()
    });
    let provider = VirtualDeviceProvider::with_cameras(vec![camera]);
    let output = dir.join("keep.jpg");
    fs::write(&output, b"previous photo").unwrap();

    let config = quick(PhotoConfiguration {
        output_path: output.clone(),
        ..Default::default()
    });
    let (_, result) = run(&provider, config);

    assert!(result.is_err());
    assert_eq!(fs::read(&output).unwrap(), b"previous photo");
}

#[test]
fn selected_device_is_used_and_named_in_metadata() {
    let dir = TempDir::new();
    let provider = VirtualDeviceProvider::with_cameras(vec![
        VirtualCamera::vga("Integrated Camera"),
        VirtualCamera::hd("External Camera"),
    ]);
    let output = dir.join("external.jpg");
    let config = quick(PhotoConfiguration {
        output_path: output.clone(),
        device_index: Some(1),
        write_metadata: true,
        ..Default::default()
    });

    let (_, result) = run(&provider, config);
    let photo = result.unwrap();

    assert_eq!(image::image_dimensions(&output).unwrap(), (1920, 1080));
    let metadata = read_metadata(&output).unwrap();
    assert_eq!(metadata.device_name.as_deref(), Some("External Camera"));
    assert_eq!(metadata.checksum, photo.checksum);
}

#[test]
fn out_of_range_device_index_activates_nothing() {
    let dir = TempDir::new();
    let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("Only Camera")]);
    let config = quick(PhotoConfiguration {
        output_path: dir.join("none.jpg"),
        device_index: Some(1),
        ..Default::default()
    });

    let (controller, result) = run(&provider, config);

    assert!(matches!(result, Err(CaptureError::InvalidArgument(_))));
    assert_eq!(controller.state().failure().unwrap().0, PipelineStep::SelectDevice);
    assert_eq!(provider.activation_count(), 0);
}

#[test]
fn device_is_exclusive_while_pipeline_holds_it() {
    let dir = TempDir::new();
    let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("Shared Camera")]);
    let config = quick(PhotoConfiguration {
        output_path: dir.join("exclusive.jpg"),
        ..Default::default()
    });

    let (controller, result) = run(&provider, config);
    result.unwrap();

    let descriptor = provider.enumerate().unwrap().remove(0);
    assert!(matches!(
        provider.activate(descriptor).err().unwrap(),
        CaptureError::DeviceUnavailable(_)
    ));

    drop(controller);
    let descriptor = provider.enumerate().unwrap().remove(0);
    assert!(provider.activate(descriptor).is_ok());
}

#[test]
fn unsupported_still_size_is_rejected_at_bind() {
    let dir = TempDir::new();
    let camera = VirtualCamera::vga("Small Camera").with_behavior(VirtualBehavior {
        max_photo_size: Some(FrameSize::new(640, 480)),
        ..Default::default()
    });
    let provider = VirtualDeviceProvider::with_cameras(vec![camera]);
    let output = dir.join("too_big.jpg");
    let config = quick(PhotoConfiguration {
        output_path: output.clone(),
        ..Default::default()
    })
    .with_photo_size(4096, 2160);

    let (controller, result) = run(&provider, config);

    assert!(matches!(result, Err(CaptureError::FormatRejected { .. })));
    assert_eq!(controller.state().failure().unwrap().0, PipelineStep::TakePhoto);
    assert!(!output.exists());
}

#[test]
fn slow_encoder_is_awaited_rather_than_raced() {
    let dir = TempDir::new();
    let camera = VirtualCamera::vga("Slow Camera").with_behavior(VirtualBehavior {
        encode_delay: Duration::from_millis(300),
        ..Default::default()
    });
    let provider = VirtualDeviceProvider::with_cameras(vec![camera]);
    let config = quick(PhotoConfiguration {
        output_path: dir.join("slow.jpg"),
        ..Default::default()
    });

    let (_, result) = run(&provider, config);
    let photo = result.unwrap();
    assert_eq!(image::image_dimensions(&photo.file_path).unwrap(), (640, 480));
}

#[test]
fn zero_denominator_frame_rate_falls_back_to_default_pacing() {
    let dir = TempDir::new();
    let mut camera = VirtualCamera::vga("Odd Camera");
    camera.preview.frame_rate = Some(Ratio::new(30, 0));
    let provider = VirtualDeviceProvider::with_cameras(vec![camera]);
    let config = quick(PhotoConfiguration {
        output_path: dir.join("odd_rate.jpg"),
        ..Default::default()
    });

    let (controller, result) = run(&provider, config);

    assert!(result.unwrap().file_path.exists());
    assert!(controller.state().is_complete());
}

#[test]
fn still_larger_than_jpeg_allows_is_rejected_at_bind() {
    let dir = TempDir::new();
    let provider = VirtualDeviceProvider::with_cameras(vec![VirtualCamera::vga("Cam")]);
    let output = dir.join("huge.jpg");
    let config = quick(PhotoConfiguration {
        output_path: output.clone(),
        ..Default::default()
    })
    .with_photo_size(70_000, 480);

    let (controller, result) = run(&provider, config);

    let err = result.unwrap_err();
    assert!(matches!(err, CaptureError::FormatRejected { .. }));
    assert_eq!(err.status(), PlatformStatus::INVALID_MEDIA_TYPE);
    assert_eq!(controller.state().failure().unwrap().0, PipelineStep::TakePhoto);
    assert!(!output.exists());
}
