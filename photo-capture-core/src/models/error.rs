use std::fmt;

use thiserror::Error;

/// A platform-defined 32-bit status code (HRESULT layout on Windows).
///
/// This is the sole externally observable error channel of a run: every
/// `CaptureError` maps to one via [`CaptureError::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlatformStatus(pub i32);

impl PlatformStatus {
    pub const OK: Self = Self(0);
    /// `E_INVALIDARG`
    pub const INVALID_ARGUMENT: Self = Self(0x8007_0057_u32 as i32);
    /// `MF_E_NO_CAPTURE_DEVICES_AVAILABLE`
    pub const NO_CAPTURE_DEVICES: Self = Self(0xC00D_ABE0_u32 as i32);
    /// `MF_E_ATTRIBUTENOTFOUND`
    pub const ATTRIBUTE_NOT_FOUND: Self = Self(0xC00D_36E6_u32 as i32);
    /// `MF_E_INVALIDMEDIATYPE`
    pub const INVALID_MEDIA_TYPE: Self = Self(0xC00D_36B4_u32 as i32);
    /// `MF_E_INVALIDREQUEST`
    pub const INVALID_REQUEST: Self = Self(0xC00D_36B2_u32 as i32);
    /// `MF_E_NOT_INITIALIZED`
    pub const NOT_INITIALIZED: Self = Self(0xC00D_36B6_u32 as i32);
    /// `E_FAIL`
    pub const FAIL: Self = Self(0x8000_4005_u32 as i32);
    /// `HRESULT_FROM_WIN32(ERROR_TIMEOUT)`
    pub const TIMEOUT: Self = Self(0x8007_05B4_u32 as i32);
    /// `HRESULT_FROM_WIN32(ERROR_WRITE_FAULT)`
    pub const WRITE_FAULT: Self = Self(0x8007_001D_u32 as i32);

    pub fn is_success(self) -> bool {
        self.0 >= 0
    }

    pub fn code(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for PlatformStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.code())
    }
}

/// Errors that can occur while driving the capture pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// Bad caller input or a call made from the wrong pipeline state.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("device unavailable: {0}")]
    DeviceUnavailable(String),

    /// A format attribute required for negotiation is missing on the source.
    #[error("attribute unavailable: {0}")]
    AttributeUnavailable(&'static str),

    #[error("format rejected by sink: {reason} ({status})")]
    FormatRejected { reason: String, status: PlatformStatus },

    #[error("{operation} failed: {status}")]
    PipelineStepFailed { operation: String, status: PlatformStatus },

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("storage error: {0}")]
    StorageError(String),
}

impl CaptureError {
    pub fn step_failed(operation: impl Into<String>, status: PlatformStatus) -> Self {
        Self::PipelineStepFailed {
            operation: operation.into(),
            status,
        }
    }

    /// Classify a failure status reported for `operation`.
    ///
    /// `NO_CAPTURE_DEVICES` means the device went away and becomes
    /// `DeviceUnavailable`; anything else is a failed step.
    pub fn from_status(operation: impl Into<String>, status: PlatformStatus) -> Self {
        let operation = operation.into();
        if status == PlatformStatus::NO_CAPTURE_DEVICES {
            Self::DeviceUnavailable(format!("{operation}: no video capture device available"))
        } else {
            Self::step_failed(operation, status)
        }
    }

    /// The platform status code this error surfaces as.
    pub fn status(&self) -> PlatformStatus {
        match self {
            Self::InvalidArgument(_) => PlatformStatus::INVALID_ARGUMENT,
            Self::DeviceUnavailable(_) => PlatformStatus::NO_CAPTURE_DEVICES,
            Self::AttributeUnavailable(_) => PlatformStatus::ATTRIBUTE_NOT_FOUND,
            Self::FormatRejected { status, .. } => *status,
            Self::PipelineStepFailed { status, .. } => *status,
            Self::Timeout(_) => PlatformStatus::TIMEOUT,
            Self::StorageError(_) => PlatformStatus::WRITE_FAULT,
        }
    }
}
