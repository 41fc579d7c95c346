use crate::models::device::DeviceDescriptor;
use crate::models::error::CaptureError;
use crate::traits::device_provider::DeviceProvider;

/// Enumerates capture devices and activates the one a caller selects.
pub struct DeviceRegistry<P: DeviceProvider> {
    provider: P,
}

impl<P: DeviceProvider> DeviceRegistry<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// List available capture devices. Empty when none are connected.
    pub fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        let devices = self.provider.enumerate()?;
        log::debug!("enumerated {} capture device(s)", devices.len());
        Ok(devices)
    }

    /// Activate a descriptor obtained from [`enumerate`](Self::enumerate).
    pub fn activate(&self, descriptor: DeviceDescriptor) -> Result<P::Device, CaptureError> {
        log::info!("activating device {}: {}", descriptor.index, descriptor.name);
        self.provider.activate(descriptor)
    }

    /// Enumerate and pick the descriptor at `index` without activating it.
    ///
    /// An out-of-range index fails with `InvalidArgument`.
    pub fn select(&self, index: u32) -> Result<DeviceDescriptor, CaptureError> {
        let mut devices = self.enumerate()?;
        let count = devices.len();
        if index as usize >= count {
            return Err(CaptureError::InvalidArgument(format!(
                "invalid device index {index} ({count} device(s) available)"
            )));
        }

        // The rest of the enumeration is released here.
        Ok(devices.swap_remove(index as usize))
    }
}
