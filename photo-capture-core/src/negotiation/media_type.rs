//! Derivation of sink-compatible media formats from a source's native format.
//!
//! Only an allowlist of attributes is carried over: sinks reject attributes
//! they do not recognise, so the derived format holds nothing beyond what the
//! target kind can use.

use crate::models::error::CaptureError;
use crate::models::media_format::{
    FrameSize, ImageFormat, ImageSubtype, MediaFormat, VideoFormat, VideoSubtype,
};

/// Subtype every preview stream is negotiated to.
pub const PREVIEW_SUBTYPE: VideoSubtype = VideoSubtype::Rgb32;

/// Clone the geometry of `source` into a video format stamped with `target`.
///
/// Frame size, frame rate, pixel aspect ratio and interlace mode are copied
/// when present and omitted when absent. The result is always marked as having
/// independently decodable samples.
pub fn derive_compatible_video_format(source: &MediaFormat, target: VideoSubtype) -> VideoFormat {
    let derived = match source {
        MediaFormat::Video(native) => VideoFormat {
            subtype: target,
            frame_size: native.frame_size,
            frame_rate: native.frame_rate,
            pixel_aspect_ratio: native.pixel_aspect_ratio,
            interlace_mode: native.interlace_mode,
            all_samples_independent: true,
        },
        MediaFormat::Image(native) => VideoFormat {
            frame_size: native.frame_size,
            all_samples_independent: true,
            ..VideoFormat::new(target)
        },
    };

    log::debug!("derived video format {} from {}", MediaFormat::Video(derived.clone()), source);
    derived
}

/// Build a JPEG still-image format compatible with `source`.
///
/// With `requested` of None the frame size is copied from `source` and its
/// absence is an `AttributeUnavailable` error. An explicit size is used
/// verbatim, overriding the source geometry; whether the device can deliver
/// it is only known when the sink binds it.
pub fn derive_compatible_photo_format(
    source: &MediaFormat,
    requested: Option<FrameSize>,
) -> Result<ImageFormat, CaptureError> {
    let frame_size = match requested {
        None => source
            .frame_size()
            .ok_or(CaptureError::AttributeUnavailable("frame size"))?,
        Some(size) if size.is_empty() => {
            return Err(CaptureError::InvalidArgument(format!(
                "photo size {size} must set both width and height"
            )));
        }
        Some(size) => size,
    };

    let derived = ImageFormat {
        subtype: ImageSubtype::Jpeg,
        frame_size: Some(frame_size),
    };
    log::debug!("derived photo format {} from {}", MediaFormat::Image(derived.clone()), source);
    Ok(derived)
}
