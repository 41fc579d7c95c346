use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::media_format::{FrameSize, ImageFormat, ImageSubtype};

/// Result returned when a photo has been written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoResult {
    pub file_path: PathBuf,
    pub format: ImageFormat,
    pub size_bytes: u64,
    pub checksum: String,
    pub metadata: PhotoMetadata,
}

/// Metadata stored alongside a photo.
///
/// Serializable for the JSON sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoMetadata {
    pub id: String,
    pub file_path: String,
    pub device_name: Option<String>,
    pub subtype: ImageSubtype,
    pub frame_size: Option<FrameSize>,
    pub size_bytes: u64,
    pub checksum: String,
    pub created_at: String,
}

impl PhotoMetadata {
    pub fn new(
        file_path: &str,
        device_name: Option<String>,
        format: &ImageFormat,
        size_bytes: u64,
        checksum: &str,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file_path: file_path.to_string(),
            device_name,
            subtype: format.subtype,
            frame_size: format.frame_size,
            size_bytes,
            checksum: checksum.to_string(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
