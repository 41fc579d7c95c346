//! COM and Media Foundation lifetime for the calling thread.

use windows::Win32::Media::MediaFoundation::{MFShutdown, MFStartup, MFSTARTUP_FULL, MF_VERSION};
use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED};

use photo_capture_core::models::error::{CaptureError, PlatformStatus};

/// RAII guard for `CoInitializeEx` (MTA) + `MFStartup`.
///
/// Must outlive every Media Foundation object created on this thread, so
/// create it first and drop it last.
pub struct MediaFoundationRuntime {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl MediaFoundationRuntime {
    pub fn start() -> Result<Self, CaptureError> {
        unsafe {
            CoInitializeEx(None, COINIT_MULTITHREADED)
                .ok()
                .map_err(|e| CaptureError::step_failed("CoInitializeEx", PlatformStatus(e.code().0)))?;

            if let Err(e) = MFStartup(MF_VERSION, MFSTARTUP_FULL) {
                CoUninitialize();
                return Err(CaptureError::step_failed("MFStartup", PlatformStatus(e.code().0)));
            }
        }

        log::debug!("Media Foundation started");
        Ok(Self {
            _not_send: std::marker::PhantomData,
        })
    }
}

impl Drop for MediaFoundationRuntime {
    fn drop(&mut self) {
        unsafe {
            if let Err(e) = MFShutdown() {
                log::warn!("MFShutdown failed: {}", e);
            }
            CoUninitialize();
        }
    }
}
