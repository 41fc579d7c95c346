use std::fs::{self, File};
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

use crate::models::error::CaptureError;
use crate::models::media_format::FrameSize;

const JPEG_QUALITY: u8 = 90;

/// A packed BGRX (RGB32) test pattern, the layout preview sinks receive.
pub fn rgb32_pattern(size: FrameSize) -> Vec<u8> {
    let (w, h) = (size.width as usize, size.height as usize);
    let mut frame = vec![0u8; w * h * 4];
    for (i, pixel) in frame.chunks_exact_mut(4).enumerate() {
        let (x, y) = (i % w, i / w);
        pixel[0] = 128;
        pixel[1] = (y * 255 / h.max(1)) as u8;
        pixel[2] = (x * 255 / w.max(1)) as u8;
        pixel[3] = 0xFF;
    }
    frame
}

fn rgb24_pattern(size: FrameSize) -> Vec<u8> {
    let (w, h) = (size.width as usize, size.height as usize);
    let mut image = Vec::with_capacity(w * h * 3);
    for y in 0..h {
        for x in 0..w {
            image.push((x * 255 / w.max(1)) as u8);
            image.push((y * 255 / h.max(1)) as u8);
            image.push(128);
        }
    }
    image
}

/// Encode a test pattern of `size` as JPEG at `path`.
///
/// The file is written under a temporary name and renamed into place, so
/// `path` either holds a complete photo or is left untouched.
pub fn write_jpeg(path: &Path, size: FrameSize) -> Result<(), CaptureError> {
    if size.is_empty() {
        return Err(CaptureError::InvalidArgument(format!("cannot encode a {size} image")));
    }

    let partial = path.with_extension("partial");
    let encoded = (|| {
        let file = File::create(&partial)
            .map_err(|e| CaptureError::StorageError(format!("failed to create photo: {}", e)))?;
        let mut encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
        encoder
            .encode(&rgb24_pattern(size), size.width, size.height, ExtendedColorType::Rgb8)
            .map_err(|e| CaptureError::StorageError(format!("failed to encode photo: {}", e)))
    })();

    match encoded {
        Ok(()) => fs::rename(&partial, path)
            .map_err(|e| CaptureError::StorageError(format!("failed to move photo into place: {}", e))),
        Err(e) => {
            fs::remove_file(&partial).ok();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_has_four_bytes_per_pixel() {
        let frame = rgb32_pattern(FrameSize::new(4, 2));
        assert_eq!(frame.len(), 4 * 2 * 4);
        assert!(frame.chunks_exact(4).all(|p| p[3] == 0xFF));
    }

    #[test]
    fn jpeg_has_requested_dimensions() {
        let path = std::env::temp_dir().join(format!("photo_capture_test_{}.jpg", uuid::Uuid::new_v4()));
        write_jpeg(&path, FrameSize::new(64, 48)).unwrap();

        assert_eq!(image::image_dimensions(&path).unwrap(), (64, 48));
        assert!(!path.with_extension("partial").exists());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn empty_size_writes_nothing() {
        let path = std::env::temp_dir().join(format!("photo_capture_test_{}.jpg", uuid::Uuid::new_v4()));
        assert!(write_jpeg(&path, FrameSize::new(0, 48)).is_err());
        assert!(!path.exists());
    }
}
