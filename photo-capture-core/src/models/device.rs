use std::fmt;

/// An activatable capture device, as produced by enumeration.
///
/// The descriptor is consumed by activation; enumeration results are not
/// retained beyond selecting one of them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Position in the enumerated sequence.
    pub index: u32,
    /// Human-readable name.
    pub name: String,
    /// Opaque platform handle used to activate the device (symbolic link on Windows).
    pub activation_handle: String,
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:2}: {}", self.index, self.name)
    }
}

/// Which of a source's streams should feed a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamRole {
    /// The device's preferred stream for live preview.
    Preview,
    /// The device's preferred stream for still capture.
    Photo,
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Preview => f.write_str("preview"),
            Self::Photo => f.write_str("photo"),
        }
    }
}
