//! # photo-capture-windows
//!
//! Windows Media Foundation backend for photo-capture-core.
//!
//! Provides:
//! - `MfDeviceProvider`: video capture device enumeration and activation
//! - `MfCaptureEngine`: `IMFCaptureEngine` with its source, preview and photo sinks
//! - `MediaFoundationRuntime`: COM + Media Foundation startup guard
//!
//! ## Platform Requirements
//! - Windows 8+ (capture engine)
//! - Visual Studio Build Tools 2022 + Windows SDK for linking
//!
//! ## Usage
//! ```ignore
//! use photo_capture_core::{DeviceRegistry, PhotoConfiguration, PipelineController};
//! use photo_capture_windows::{MediaFoundationRuntime, MfCaptureEngine, MfDeviceProvider};
//!
//! let _runtime = MediaFoundationRuntime::start()?;
//! let registry = DeviceRegistry::new(MfDeviceProvider::new());
//! let mut pipeline = PipelineController::new(MfCaptureEngine::new()?, PhotoConfiguration::default())?;
//! let photo = pipeline.run(&registry)?;
//! ```

#[cfg(target_os = "windows")]
mod hresult;

#[cfg(target_os = "windows")]
pub mod callbacks;
#[cfg(target_os = "windows")]
pub mod capture_engine;
#[cfg(target_os = "windows")]
pub mod device_enumerator;
#[cfg(target_os = "windows")]
pub mod media_type;
#[cfg(target_os = "windows")]
pub mod runtime;

#[cfg(target_os = "windows")]
pub use capture_engine::{MfCaptureEngine, MfCaptureSource, MfPhotoSink, MfPreviewSink};
#[cfg(target_os = "windows")]
pub use device_enumerator::{MfDevice, MfDeviceProvider};
#[cfg(target_os = "windows")]
pub use runtime::MediaFoundationRuntime;
