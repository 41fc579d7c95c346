use crate::models::device::DeviceDescriptor;
use crate::models::error::CaptureError;

/// Interface for platform-specific capture device discovery.
///
/// Implemented by:
/// - `MfDeviceProvider` (Windows Media Foundation)
/// - `VirtualDeviceProvider` (in-process virtual cameras)
pub trait DeviceProvider: Send + Sync {
    /// Activated device handle, handed to the capture engine at initialization.
    ///
    /// Holding one keeps exclusive hardware access to the device until dropped.
    type Device: Send;

    /// List devices matching the video-capture filter, in platform order.
    ///
    /// An empty list is a valid outcome, not an error.
    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, CaptureError>;

    /// Activate an enumerated device.
    ///
    /// Fails with `DeviceUnavailable` if the descriptor is stale or the device
    /// was disconnected since enumeration.
    fn activate(&self, descriptor: DeviceDescriptor) -> Result<Self::Device, CaptureError>;
}
