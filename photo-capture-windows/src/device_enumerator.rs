//! Video capture device enumeration via `MFEnumDeviceSources`.
//!
//! Devices are identified by their symbolic link, which stays valid for as
//! long as the device is plugged in. Activating by link instead of keeping
//! the `IMFActivate` array alive lets a descriptor be consumed on its own.

use windows::core::{HSTRING, PWSTR};
use windows::Win32::Media::MediaFoundation::*;
use windows::Win32::System::Com::CoTaskMemFree;

use photo_capture_core::models::device::DeviceDescriptor;
use photo_capture_core::models::error::CaptureError;
use photo_capture_core::traits::device_provider::DeviceProvider;

use crate::hresult::step_failed;

/// Device provider over the Media Foundation video capture devices.
///
/// Requires a live [`MediaFoundationRuntime`](crate::MediaFoundationRuntime)
/// on the calling thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct MfDeviceProvider;

impl MfDeviceProvider {
    pub fn new() -> Self {
        Self
    }
}

/// An activated Media Foundation video source.
pub struct MfDevice {
    pub(crate) source: IMFMediaSource,
}

// SAFETY: Media Foundation objects live in the MTA and are free-threaded.
unsafe impl Send for MfDevice {}

impl DeviceProvider for MfDeviceProvider {
    type Device = MfDevice;

    fn enumerate(&self) -> Result<Vec<DeviceDescriptor>, CaptureError> {
        unsafe {
            let attributes = video_capture_attributes(1)?;

            let mut devices: *mut Option<IMFActivate> = std::ptr::null_mut();
            let mut count: u32 = 0;
            MFEnumDeviceSources(&attributes, &mut devices, &mut count)
                .map_err(step_failed("MFEnumDeviceSources"))?;

            let activates = if devices.is_null() {
                Vec::new()
            } else {
                // Take ownership of every entry so each is released on drop.
                let taken: Vec<Option<IMFActivate>> = std::slice::from_raw_parts_mut(devices, count as usize)
                    .iter_mut()
                    .map(Option::take)
                    .collect();
                CoTaskMemFree(Some(devices as *const _));
                taken
            };

            let mut descriptors = Vec::with_capacity(activates.len());
            for (index, activate) in activates.into_iter().enumerate() {
                let Some(activate) = activate else { continue };

                let name = allocated_string(&activate, &MF_DEVSOURCE_ATTRIBUTE_FRIENDLY_NAME)
                    .map_err(step_failed("GetString"))?;
                let link = allocated_string(
                    &activate,
                    &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_SYMBOLIC_LINK,
                )
                .map_err(step_failed("GetString"))?;

                descriptors.push(DeviceDescriptor {
                    index: index as u32,
                    name,
                    activation_handle: link,
                });
            }

            log::debug!("found {} video capture device(s)", descriptors.len());
            Ok(descriptors)
        }
    }

    fn activate(&self, descriptor: DeviceDescriptor) -> Result<MfDevice, CaptureError> {
        unsafe {
            let attributes = video_capture_attributes(2)?;
            attributes
                .SetString(
                    &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_SYMBOLIC_LINK,
                    &HSTRING::from(descriptor.activation_handle.as_str()),
                )
                .map_err(step_failed("SetString"))?;

            let source = MFCreateDeviceSource(&attributes).map_err(|e| {
                CaptureError::DeviceUnavailable(format!(
                    "{} could not be activated: {}",
                    descriptor.name,
                    e.message()
                ))
            })?;

            log::info!("activated {}", descriptor.name);
            Ok(MfDevice { source })
        }
    }
}

unsafe fn video_capture_attributes(capacity: u32) -> Result<IMFAttributes, CaptureError> {
    let mut attributes: Option<IMFAttributes> = None;
    MFCreateAttributes(&mut attributes, capacity).map_err(step_failed("MFCreateAttributes"))?;
    let attributes = attributes.ok_or(CaptureError::AttributeUnavailable("device attributes"))?;

    attributes
        .SetGUID(
            &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE,
            &MF_DEVSOURCE_ATTRIBUTE_SOURCE_TYPE_VIDCAP_GUID,
        )
        .map_err(step_failed("SetGUID"))?;
    Ok(attributes)
}

unsafe fn allocated_string(
    activate: &IMFActivate,
    key: &windows::core::GUID,
) -> windows::core::Result<String> {
    let mut value = PWSTR::null();
    let mut length: u32 = 0;
    activate.GetAllocatedString(key, &mut value, &mut length)?;

    let text = value.to_string().unwrap_or_default();
    CoTaskMemFree(Some(value.0 as *const _));
    Ok(text)
}
