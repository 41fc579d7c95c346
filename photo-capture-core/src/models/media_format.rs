use std::fmt;

use serde::{Deserialize, Serialize};

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// A rational value such as a frame rate (30000/1001) or pixel aspect ratio (1/1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ratio {
    pub numerator: u32,
    pub denominator: u32,
}

impl Ratio {
    pub const fn new(numerator: u32, denominator: u32) -> Self {
        Self {
            numerator,
            denominator,
        }
    }

    pub fn as_f64(&self) -> f64 {
        if self.denominator == 0 {
            return 0.0;
        }
        self.numerator as f64 / self.denominator as f64
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

/// Video interlace mode, numbered as the platform enumerates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterlaceMode {
    Unknown,
    Progressive,
    FieldInterleavedUpperFirst,
    FieldInterleavedLowerFirst,
    FieldSingleUpper,
    FieldSingleLower,
    MixedInterlaceOrProgressive,
}

impl InterlaceMode {
    pub fn from_raw(value: u32) -> Self {
        match value {
            2 => Self::Progressive,
            3 => Self::FieldInterleavedUpperFirst,
            4 => Self::FieldInterleavedLowerFirst,
            5 => Self::FieldSingleUpper,
            6 => Self::FieldSingleLower,
            7 => Self::MixedInterlaceOrProgressive,
            _ => Self::Unknown,
        }
    }

    pub fn to_raw(self) -> u32 {
        match self {
            Self::Unknown => 0,
            Self::Progressive => 2,
            Self::FieldInterleavedUpperFirst => 3,
            Self::FieldInterleavedLowerFirst => 4,
            Self::FieldSingleUpper => 5,
            Self::FieldSingleLower => 6,
            Self::MixedInterlaceOrProgressive => 7,
        }
    }
}

/// Pixel layout or compression of a video stream.
///
/// Identified by FOURCC, or by D3DFORMAT code for the uncompressed RGB layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VideoSubtype {
    Rgb32,
    Rgb24,
    Nv12,
    Yuy2,
    Mjpg,
    H264,
    Other(u32),
}

const D3DFMT_X8R8G8B8: u32 = 22;
const D3DFMT_R8G8B8: u32 = 20;

const fn fourcc(code: &[u8; 4]) -> u32 {
    u32::from_le_bytes(*code)
}

impl VideoSubtype {
    pub fn code(self) -> u32 {
        match self {
            Self::Rgb32 => D3DFMT_X8R8G8B8,
            Self::Rgb24 => D3DFMT_R8G8B8,
            Self::Nv12 => fourcc(b"NV12"),
            Self::Yuy2 => fourcc(b"YUY2"),
            Self::Mjpg => fourcc(b"MJPG"),
            Self::H264 => fourcc(b"H264"),
            Self::Other(code) => code,
        }
    }

    pub fn from_code(code: u32) -> Self {
        match code {
            D3DFMT_X8R8G8B8 => Self::Rgb32,
            D3DFMT_R8G8B8 => Self::Rgb24,
            c if c == fourcc(b"NV12") => Self::Nv12,
            c if c == fourcc(b"YUY2") => Self::Yuy2,
            c if c == fourcc(b"MJPG") => Self::Mjpg,
            c if c == fourcc(b"H264") => Self::H264,
            other => Self::Other(other),
        }
    }

    /// Uncompressed RGB layouts a preview surface can draw directly.
    pub fn is_uncompressed_rgb(self) -> bool {
        matches!(self, Self::Rgb32 | Self::Rgb24)
    }
}

impl fmt::Display for VideoSubtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rgb32 => f.write_str("RGB32"),
            Self::Rgb24 => f.write_str("RGB24"),
            Self::Other(code) => {
                let bytes = code.to_le_bytes();
                if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
                    write!(f, "{}", String::from_utf8_lossy(&bytes))
                } else {
                    write!(f, "0x{code:08X}")
                }
            }
            known => {
                let bytes = known.code().to_le_bytes();
                write!(f, "{}", String::from_utf8_lossy(&bytes))
            }
        }
    }
}

/// Container format of a still image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum ImageSubtype {
    Jpeg,
}

impl ImageSubtype {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
        }
    }
}

/// Encoding of a video stream. Only attributes meaningful to video live here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoFormat {
    pub subtype: VideoSubtype,
    pub frame_size: Option<FrameSize>,
    pub frame_rate: Option<Ratio>,
    pub pixel_aspect_ratio: Option<Ratio>,
    pub interlace_mode: Option<InterlaceMode>,
    /// Every sample is independently decodable (no inter-frame dependencies).
    pub all_samples_independent: bool,
}

impl VideoFormat {
    /// A format carrying only a subtype; every optional attribute absent.
    pub fn new(subtype: VideoSubtype) -> Self {
        Self {
            subtype,
            frame_size: None,
            frame_rate: None,
            pixel_aspect_ratio: None,
            interlace_mode: None,
            all_samples_independent: false,
        }
    }
}

/// Encoding of a still image. Frame rate and interlacing do not apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFormat {
    pub subtype: ImageSubtype,
    pub frame_size: Option<FrameSize>,
}

/// Major kind of a media format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MajorKind {
    Video,
    Image,
}

impl fmt::Display for MajorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => f.write_str("video"),
            Self::Image => f.write_str("image"),
        }
    }
}

/// Structured description of a stream's encoding, keyed by major kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaFormat {
    Video(VideoFormat),
    Image(ImageFormat),
}

impl MediaFormat {
    pub fn kind(&self) -> MajorKind {
        match self {
            Self::Video(_) => MajorKind::Video,
            Self::Image(_) => MajorKind::Image,
        }
    }

    pub fn frame_size(&self) -> Option<FrameSize> {
        match self {
            Self::Video(v) => v.frame_size,
            Self::Image(i) => i.frame_size,
        }
    }

    pub fn as_video(&self) -> Option<&VideoFormat> {
        match self {
            Self::Video(v) => Some(v),
            Self::Image(_) => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageFormat> {
        match self {
            Self::Image(i) => Some(i),
            Self::Video(_) => None,
        }
    }
}

impl From<VideoFormat> for MediaFormat {
    fn from(format: VideoFormat) -> Self {
        Self::Video(format)
    }
}

impl From<ImageFormat> for MediaFormat {
    fn from(format: ImageFormat) -> Self {
        Self::Image(format)
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video(v) => {
                write!(f, "video/{}", v.subtype)?;
                if let Some(size) = v.frame_size {
                    write!(f, " {size}")?;
                }
                if let Some(rate) = v.frame_rate {
                    write!(f, " @{:.2}fps", rate.as_f64())?;
                }
                Ok(())
            }
            Self::Image(i) => {
                write!(f, "image/{}", i.subtype.extension())?;
                if let Some(size) = i.frame_size {
                    write!(f, " {size}")?;
                }
                Ok(())
            }
        }
    }
}
