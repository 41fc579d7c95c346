use std::path::PathBuf;
use std::time::Duration;

use super::media_format::FrameSize;

/// Default file name the photo is written to.
pub const DEFAULT_OUTPUT_FILE: &str = "photo.jpg";

/// Configuration for a single photo-capture run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoConfiguration {
    /// How long the preview runs before the still is taken, letting
    /// exposure, white balance and focus converge (default: 5000 ms).
    pub stabilization: Duration,

    /// Requested still size, or None to use the source's native size.
    pub photo_size: Option<FrameSize>,

    /// Where the encoded photo is written (default: `photo.jpg`).
    pub output_path: PathBuf,

    /// Device to activate by enumeration index, or None for the system default.
    pub device_index: Option<u32>,

    /// Pause after the preview reports started, before it is treated as
    /// streaming reliably (default: 500 ms).
    pub preview_settle: Duration,

    /// Upper bound on each wait for an engine completion event (default: 10 s).
    pub event_timeout: Duration,

    /// Write a `<photo>.metadata.json` sidecar next to the photo.
    pub write_metadata: bool,
}

impl PhotoConfiguration {
    /// Build the requested photo size from raw pixel counts, where 0x0 means native.
    pub fn with_photo_size(mut self, width: u32, height: u32) -> Self {
        self.photo_size = if width == 0 && height == 0 {
            None
        } else {
            Some(FrameSize::new(width, height))
        };
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(size) = self.photo_size {
            if size.is_empty() {
                return Err(format!(
                    "photo width and height must both be set or both be zero, got {size}"
                ));
            }
        }
        if self.output_path.as_os_str().is_empty() {
            return Err("output path must not be empty".into());
        }
        if self.output_path.is_dir() {
            return Err(format!(
                "output path is a directory: {}",
                self.output_path.display()
            ));
        }
        if self.event_timeout.is_zero() {
            return Err("event timeout must be positive".into());
        }
        Ok(())
    }
}

impl Default for PhotoConfiguration {
    fn default() -> Self {
        Self {
            stabilization: Duration::from_millis(5000),
            photo_size: None,
            output_path: PathBuf::from(DEFAULT_OUTPUT_FILE),
            device_index: None,
            preview_settle: Duration::from_millis(500),
            event_timeout: Duration::from_secs(10),
            write_metadata: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_command_line_defaults() {
        let config = PhotoConfiguration::default();
        assert_eq!(config.stabilization, Duration::from_millis(5000));
        assert_eq!(config.photo_size, None);
        assert_eq!(config.output_path, PathBuf::from("photo.jpg"));
        assert_eq!(config.device_index, None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_size_means_native() {
        let config = PhotoConfiguration::default().with_photo_size(0, 0);
        assert_eq!(config.photo_size, None);

        let config = PhotoConfiguration::default().with_photo_size(1280, 720);
        assert_eq!(config.photo_size, Some(FrameSize::new(1280, 720)));
    }

    #[test]
    fn partial_size_is_rejected() {
        let config = PhotoConfiguration::default().with_photo_size(1280, 0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn directory_output_is_rejected() {
        let config = PhotoConfiguration {
            output_path: std::env::temp_dir(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_event_timeout_is_rejected() {
        let config = PhotoConfiguration {
            event_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
