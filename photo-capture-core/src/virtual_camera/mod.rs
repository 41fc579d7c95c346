//! In-process virtual capture devices.
//!
//! Implements every platform seam without hardware: enumeration with
//! disconnect simulation and exclusive activation, a capture engine that
//! streams a test pattern to the preview sink on its own thread, and a photo
//! trigger that encodes a JPEG of the negotiated size through the `image`
//! crate before reporting completion. Driver quirks are switched on per camera
//! through [`VirtualBehavior`].

pub mod device;
pub mod engine;
pub mod render;

pub use device::{VirtualBehavior, VirtualCamera, VirtualDevice, VirtualDeviceProvider};
pub use engine::{VirtualEngine, VirtualPhotoSink, VirtualPreviewSink, VirtualSource};
