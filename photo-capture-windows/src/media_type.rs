//! Conversion between `IMFMediaType` and the core `MediaFormat`.
//!
//! Only the attributes the negotiator works with are carried across. Paired
//! attributes (frame size, frame rate, pixel aspect ratio) are packed into a
//! `u64` with the first value in the high 32 bits.

use windows::core::GUID;
use windows::Win32::Graphics::Imaging::GUID_ContainerFormatJpeg;
use windows::Win32::Media::MediaFoundation::*;

use photo_capture_core::models::error::{CaptureError, PlatformStatus};
use photo_capture_core::models::media_format::{
    FrameSize, ImageFormat, ImageSubtype, InterlaceMode, MediaFormat, Ratio, VideoFormat,
    VideoSubtype,
};

use crate::hresult::step_failed;

/// Trailing fields shared by every FOURCC-based video subtype GUID.
const FOURCC_BASE: (u16, u16, [u8; 8]) = (
    0x0000,
    0x0010,
    [0x80, 0x00, 0x00, 0xAA, 0x00, 0x38, 0x9B, 0x71],
);

pub fn pack_pair(high: u32, low: u32) -> u64 {
    ((high as u64) << 32) | low as u64
}

pub fn unpack_pair(value: u64) -> (u32, u32) {
    ((value >> 32) as u32, value as u32)
}

pub fn subtype_guid(subtype: VideoSubtype) -> GUID {
    GUID::from_values(subtype.code(), FOURCC_BASE.0, FOURCC_BASE.1, FOURCC_BASE.2)
}

/// FOURCC / D3DFORMAT code of a video subtype GUID, if it follows the base layout.
pub fn subtype_code(guid: &GUID) -> Option<u32> {
    (guid.data2 == FOURCC_BASE.0 && guid.data3 == FOURCC_BASE.1 && guid.data4 == FOURCC_BASE.2)
        .then_some(guid.data1)
}

/// Build a new `IMFMediaType` describing `format`.
pub fn to_media_type(format: &MediaFormat) -> Result<IMFMediaType, CaptureError> {
    unsafe {
        let media_type = MFCreateMediaType().map_err(step_failed("MFCreateMediaType"))?;

        match format {
            MediaFormat::Video(video) => {
                media_type
                    .SetGUID(&MF_MT_MAJOR_TYPE, &MFMediaType_Video)
                    .map_err(step_failed("SetGUID major type"))?;
                media_type
                    .SetGUID(&MF_MT_SUBTYPE, &subtype_guid(video.subtype))
                    .map_err(step_failed("SetGUID sub type"))?;

                if let Some(size) = video.frame_size {
                    set_pair(&media_type, &MF_MT_FRAME_SIZE, size.width, size.height)?;
                }
                if let Some(rate) = video.frame_rate {
                    set_pair(&media_type, &MF_MT_FRAME_RATE, rate.numerator, rate.denominator)?;
                }
                if let Some(par) = video.pixel_aspect_ratio {
                    set_pair(&media_type, &MF_MT_PIXEL_ASPECT_RATIO, par.numerator, par.denominator)?;
                }
                if let Some(mode) = video.interlace_mode {
                    media_type
                        .SetUINT32(&MF_MT_INTERLACE_MODE, mode.to_raw())
                        .map_err(step_failed("SetUINT32 interlace mode"))?;
                }
                if video.all_samples_independent {
                    media_type
                        .SetUINT32(&MF_MT_ALL_SAMPLES_INDEPENDENT, 1)
                        .map_err(step_failed("SetUINT32 all samples independent"))?;
                }
            }
            MediaFormat::Image(image) => {
                media_type
                    .SetGUID(&MF_MT_MAJOR_TYPE, &MFMediaType_Image)
                    .map_err(step_failed("SetGUID major type"))?;
                let container = match image.subtype {
                    ImageSubtype::Jpeg => GUID_ContainerFormatJpeg,
                };
                media_type
                    .SetGUID(&MF_MT_SUBTYPE, &container)
                    .map_err(step_failed("SetGUID sub type"))?;

                if let Some(size) = image.frame_size {
                    set_pair(&media_type, &MF_MT_FRAME_SIZE, size.width, size.height)?;
                }
            }
        }

        Ok(media_type)
    }
}

/// Read the negotiable attributes of `media_type`. Absent optional attributes become `None`.
pub fn from_media_type(media_type: &IMFMediaType) -> Result<MediaFormat, CaptureError> {
    unsafe {
        let major = media_type
            .GetGUID(&MF_MT_MAJOR_TYPE)
            .map_err(|_| CaptureError::AttributeUnavailable("major type"))?;
        let subtype = media_type
            .GetGUID(&MF_MT_SUBTYPE)
            .map_err(|_| CaptureError::AttributeUnavailable("subtype"))?;
        let frame_size = get_pair(media_type, &MF_MT_FRAME_SIZE).map(|(w, h)| FrameSize::new(w, h));

        if major == MFMediaType_Video {
            let code = subtype_code(&subtype).ok_or_else(|| CaptureError::FormatRejected {
                reason: format!("unrecognised video subtype {:?}", subtype),
                status: PlatformStatus::INVALID_MEDIA_TYPE,
            })?;

            Ok(MediaFormat::Video(VideoFormat {
                subtype: VideoSubtype::from_code(code),
                frame_size,
                frame_rate: get_pair(media_type, &MF_MT_FRAME_RATE).map(|(n, d)| Ratio::new(n, d)),
                pixel_aspect_ratio: get_pair(media_type, &MF_MT_PIXEL_ASPECT_RATIO)
                    .map(|(n, d)| Ratio::new(n, d)),
                interlace_mode: media_type
                    .GetUINT32(&MF_MT_INTERLACE_MODE)
                    .ok()
                    .map(InterlaceMode::from_raw),
                all_samples_independent: media_type
                    .GetUINT32(&MF_MT_ALL_SAMPLES_INDEPENDENT)
                    .map(|v| v != 0)
                    .unwrap_or(false),
            }))
        } else if major == MFMediaType_Image && subtype == GUID_ContainerFormatJpeg {
            Ok(MediaFormat::Image(ImageFormat {
                subtype: ImageSubtype::Jpeg,
                frame_size,
            }))
        } else {
            Err(CaptureError::FormatRejected {
                reason: format!("unsupported media type {:?}/{:?}", major, subtype),
                status: PlatformStatus::INVALID_MEDIA_TYPE,
            })
        }
    }
}

unsafe fn set_pair(
    media_type: &IMFMediaType,
    key: &GUID,
    high: u32,
    low: u32,
) -> Result<(), CaptureError> {
    media_type
        .SetUINT64(key, pack_pair(high, low))
        .map_err(step_failed("SetUINT64"))
}

unsafe fn get_pair(media_type: &IMFMediaType, key: &GUID) -> Option<(u32, u32)> {
    media_type.GetUINT64(key).ok().map(unpack_pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_is_packed_high() {
        assert_eq!(pack_pair(1920, 1080), (1920u64 << 32) | 1080);
        assert_eq!(unpack_pair(pack_pair(640, 480)), (640, 480));
    }

    #[test]
    fn subtype_guids_match_platform_constants() {
        assert_eq!(subtype_guid(VideoSubtype::Rgb32), MFVideoFormat_RGB32);
        assert_eq!(subtype_guid(VideoSubtype::Nv12), MFVideoFormat_NV12);
        assert_eq!(subtype_code(&MFVideoFormat_YUY2), Some(VideoSubtype::Yuy2.code()));
        assert_eq!(subtype_code(&GUID_ContainerFormatJpeg), None);
    }
}
