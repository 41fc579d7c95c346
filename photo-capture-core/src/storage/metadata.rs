use std::fs;
use std::path::{Path, PathBuf};

use crate::models::error::CaptureError;
use crate::models::photo_result::PhotoMetadata;

/// Path of the JSON sidecar for `photo_path`: `{photo}.metadata.json`.
pub fn metadata_path(photo_path: &Path) -> PathBuf {
    photo_path.with_extension("metadata.json")
}

/// Write photo metadata as a JSON sidecar file.
pub fn write_metadata(metadata: &PhotoMetadata, photo_path: &Path) -> Result<(), CaptureError> {
    let json = serde_json::to_string_pretty(metadata)
        .map_err(|e| CaptureError::StorageError(format!("failed to serialize metadata: {}", e)))?;
    fs::write(metadata_path(photo_path), json)
        .map_err(|e| CaptureError::StorageError(format!("failed to write metadata: {}", e)))?;
    Ok(())
}

/// Read photo metadata from a JSON sidecar file.
pub fn read_metadata(photo_path: &Path) -> Result<PhotoMetadata, CaptureError> {
    let json = fs::read_to_string(metadata_path(photo_path))
        .map_err(|e| CaptureError::StorageError(format!("failed to read metadata: {}", e)))?;
    let metadata: PhotoMetadata = serde_json::from_str(&json)
        .map_err(|e| CaptureError::StorageError(format!("failed to parse metadata: {}", e)))?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::media_format::{FrameSize, ImageFormat, ImageSubtype};

    #[test]
    fn sidecar_sits_next_to_photo() {
        assert_eq!(
            metadata_path(Path::new("out/photo.jpg")),
            PathBuf::from("out/photo.metadata.json")
        );
    }

    #[test]
    fn write_then_read_sidecar() {
        let photo = std::env::temp_dir()
            .join(format!("photo_capture_test_{}", uuid::Uuid::new_v4()))
            .join("photo.jpg");
        fs::create_dir_all(photo.parent().unwrap()).unwrap();

        let format = ImageFormat {
            subtype: ImageSubtype::Jpeg,
            frame_size: Some(FrameSize::new(1280, 720)),
        };
        let metadata = PhotoMetadata::new(
            &photo.to_string_lossy(),
            Some("Virtual Camera".into()),
            &format,
            2048,
            "abc123",
        );

        write_metadata(&metadata, &photo).unwrap();
        let read = read_metadata(&photo).unwrap();
        assert_eq!(read, metadata);
        assert_eq!(read.frame_size, Some(FrameSize::new(1280, 720)));

        fs::remove_dir_all(photo.parent().unwrap()).ok();
    }

    #[test]
    fn missing_sidecar_is_a_storage_error() {
        let err = read_metadata(Path::new("/nonexistent/photo.jpg")).unwrap_err();
        assert!(matches!(err, CaptureError::StorageError(_)));
    }
}
