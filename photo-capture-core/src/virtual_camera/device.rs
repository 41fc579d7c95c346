use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::device::DeviceDescriptor;
use crate::models::error::{CaptureError, PlatformStatus};
use crate::models::media_format::{
    FrameSize, ImageFormat, ImageSubtype, InterlaceMode, MediaFormat, Ratio, VideoFormat,
    VideoSubtype,
};
use crate::traits::device_provider::DeviceProvider;

const HANDLE_PREFIX: &str = "virtual://camera/";

/// Switches that make a virtual camera misbehave the way real drivers do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualBehavior {
    /// The preview sink refuses every format.
    pub reject_preview_format: bool,
    /// The photo sink refuses sizes larger than this.
    pub max_photo_size: Option<FrameSize>,
    pub emit_initialized: bool,
    pub emit_preview_started: bool,
    pub emit_photo_taken: bool,
    /// The trigger is accepted, then the engine reports this error instead of a photo.
    pub photo_error: Option<PlatformStatus>,
    /// Delay between the trigger and the file appearing.
    pub encode_delay: Duration,
    /// The preview stream reports this error after delivering the given number of frames.
    pub preview_error: Option<(u32, PlatformStatus)>,
}

impl Default for VirtualBehavior {
    fn default() -> Self {
        Self {
            reject_preview_format: false,
            max_photo_size: None,
            emit_initialized: true,
            emit_preview_started: true,
            emit_photo_taken: true,
            photo_error: None,
            encode_delay: Duration::ZERO,
            preview_error: None,
        }
    }
}

/// A simulated capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualCamera {
    pub name: String,
    /// Native format of the preferred preview stream.
    pub preview: VideoFormat,
    /// Native format of the preferred still stream.
    pub photo: MediaFormat,
    pub behavior: VirtualBehavior,
}

impl VirtualCamera {
    pub fn new(name: impl Into<String>, preview: VideoFormat, photo: MediaFormat) -> Self {
        Self {
            name: name.into(),
            preview,
            photo,
            behavior: VirtualBehavior::default(),
        }
    }

    /// 1280x720 NV12 preview at 30 fps with a 1920x1080 still stream.
    pub fn hd(name: impl Into<String>) -> Self {
        Self::new(
            name,
            Self::video(VideoSubtype::Nv12, FrameSize::new(1280, 720)),
            MediaFormat::Image(ImageFormat {
                subtype: ImageSubtype::Jpeg,
                frame_size: Some(FrameSize::new(1920, 1080)),
            }),
        )
    }

    /// 640x480 YUY2 preview at 30 fps; stills come from the same stream format.
    pub fn vga(name: impl Into<String>) -> Self {
        let preview = Self::video(VideoSubtype::Yuy2, FrameSize::new(640, 480));
        Self::new(name, preview.clone(), MediaFormat::Video(preview))
    }

    pub fn with_behavior(mut self, behavior: VirtualBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    fn video(subtype: VideoSubtype, size: FrameSize) -> VideoFormat {
        VideoFormat {
            subtype,
            frame_size: Some(size),
            frame_rate: Some(Ratio::new(30, 1)),
            pixel_aspect_ratio: Some(Ratio::new(1, 1)),
            interlace_mode: Some(InterlaceMode::Progressive),
            all_samples_independent: false,
        }
    }
}

struct Slot {
    id: u64,
    camera: VirtualCamera,
}

#[derive(Default)]
struct ProviderState {
    slots: Vec<Slot>,
    next_id: u64,
    in_use: HashSet<u64>,
}

/// Device provider over a set of virtual cameras.
///
/// Cloning shares the same set, so a test can disconnect a camera behind the
/// back of a registry or engine holding a clone.
#[derive(Clone, Default)]
pub struct VirtualDeviceProvider {
    state: Arc<Mutex<ProviderState>>,
    activations: Arc<AtomicUsize>,
}

impl VirtualDeviceProvider {
    pub fn with_cameras(cameras: Vec<VirtualCamera>) -> Self {
        let provider = Self::default();
        for camera in cameras {
            provider.connect(camera);
        }
        provider
    }

    /// Plug in a camera; it enumerates after every camera already connected.
    pub fn connect(&self, camera: VirtualCamera) {
        let mut state = self.state.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.slots.push(Slot { id, camera });
    }

    /// Unplug the camera with `name`. Returns whether one was connected.
    pub fn disconnect(&self, name: &str) -> bool {
        let mut state = self.state.lock();
        let before = state.slots.len();
        state.slots.retain(|slot| slot.camera.name != name);
        state.slots.len() != before
    }

    /// Number of activation attempts made so far, successful or not.
    pub fn activation_count(&self) -> usize {
        self.activations.load(Ordering::SeqCst)
    }

    /// Activate the first connected camera, as the platform does for "default device".
    pub fn activate_default(&self) -> Result<VirtualDevice, CaptureError> {
        let descriptor = self
            .enumerate()?
            .into_iter()
            .next()
            .ok_or_else(|| CaptureError::DeviceUnavailable("no capture devices connected".into()))?;
        self.activate(descriptor)
    }
}

impl DeviceProvider for VirtualDeviceProvider {
    type Device = VirtualDevice;

    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        let state = self.state.lock();
        Ok(state
            .slots
            .iter()
            .enumerate()
            .map(|(index, slot)| DeviceDescriptor {
                index: index as u32,
                name: slot.camera.name.clone(),
                activation_handle: format!("{HANDLE_PREFIX}{}", slot.id),
            })
            .collect())
    }

    fn activate(&self, descriptor: DeviceDescriptor) -> Result<VirtualDevice, CaptureError> {
        self.activations.fetch_add(1, Ordering::SeqCst);

        let id = descriptor
            .activation_handle
            .strip_prefix(HANDLE_PREFIX)
            .and_then(|id| id.parse::<u64>().ok())
            .ok_or_else(|| {
                CaptureError::DeviceUnavailable(format!(
                    "not a virtual device: {}",
                    descriptor.activation_handle
                ))
            })?;

        let mut state = self.state.lock();
        let camera = state
            .slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.camera.clone())
            .ok_or_else(|| {
                CaptureError::DeviceUnavailable(format!("{} was disconnected", descriptor.name))
            })?;

        if !state.in_use.insert(id) {
            return Err(CaptureError::DeviceUnavailable(format!(
                "{} is in use by another pipeline",
                descriptor.name
            )));
        }

        Ok(VirtualDevice {
            camera,
            lease: DeviceLease {
                id,
                state: Arc::clone(&self.state),
            },
        })
    }
}

/// Exclusive access to a virtual camera, released on drop.
struct DeviceLease {
    id: u64,
    state: Arc<Mutex<ProviderState>>,
}

impl Drop for DeviceLease {
    fn drop(&mut self) {
        self.state.lock().in_use.remove(&self.id);
    }
}

/// An activated virtual camera.
pub struct VirtualDevice {
    camera: VirtualCamera,
    #[allow(dead_code)]
    lease: DeviceLease,
}

impl VirtualDevice {
    pub fn camera(&self) -> &VirtualCamera {
        &self.camera
    }
}
