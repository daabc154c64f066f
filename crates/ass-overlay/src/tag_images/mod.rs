//! Externally referenced raster images for `\img` override tags
//!
//! Scripts may reference images either on disk or embedded as graphic
//! attachments. Both end up as a [`TagImage`]: raw interleaved RGBA pixels
//! bound to the key the engine will be asked to look up.

pub mod attachment;
pub mod cache;
pub mod decode;
pub mod extract;

pub use attachment::{Attachment, AttachmentGroup};
pub use cache::TagImageCache;
pub use decode::{ImageDecoder, StandardImageDecoder};
pub use extract::{collect_img_paths, collect_img_paths_in_events, TagScanMode};

use std::fmt;

use crate::utils::OverlayError;

/// Source format of a tag image, inferred from the key's extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TagImageFormat {
    /// `.png`
    Png = 1,
    /// `.jpg` / `.jpeg`
    Jpeg = 2,
    /// `.webp`
    Webp = 3,
}

impl TagImageFormat {
    /// Infer the format from a path or filename extension (case-insensitive)
    pub fn from_path(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::Webp),
            _ => None,
        }
    }

    /// Numeric code used by engine tag-image extensions
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Get format as string
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "PNG",
            Self::Jpeg => "JPEG",
            Self::Webp => "WEBP",
        }
    }
}

impl fmt::Display for TagImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded image bound to a lookup key
///
/// Pixels are straight (not premultiplied) RGBA, row-major. A `TagImage`
/// always has non-zero dimensions and exactly `stride * height` bytes of
/// pixel data; decode failures never produce one.
#[derive(Clone, PartialEq, Eq)]
pub struct TagImage {
    key: String,
    basename_lower: String,
    format: TagImageFormat,
    width: u32,
    height: u32,
    stride: usize,
    rgba: Vec<u8>,
}

impl TagImage {
    /// Create a tag image from tightly packed RGBA pixels
    pub fn new(
        key: impl Into<String>,
        format: TagImageFormat,
        width: u32,
        height: u32,
        rgba: Vec<u8>,
    ) -> Result<Self, OverlayError> {
        Self::with_stride(key, format, width, height, width as usize * 4, rgba)
    }

    /// Create a tag image with an explicit row stride
    pub fn with_stride(
        key: impl Into<String>,
        format: TagImageFormat,
        width: u32,
        height: u32,
        stride: usize,
        rgba: Vec<u8>,
    ) -> Result<Self, OverlayError> {
        if width == 0 || height == 0 || stride < width as usize * 4 {
            return Err(OverlayError::InvalidDimensions);
        }
        let expected = stride * height as usize;
        if rgba.len() != expected {
            return Err(OverlayError::InvalidBufferSize {
                expected,
                actual: rgba.len(),
            });
        }

        let key = key.into();
        let basename_lower = crate::utils::text::basename_lower(&key);
        Ok(Self {
            key,
            basename_lower,
            format,
            width,
            height,
            stride,
            rgba,
        })
    }

    /// Rebind the image to a different lookup key
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self.basename_lower = crate::utils::text::basename_lower(&self.key);
        self
    }

    /// Key used to index the image inside the engine
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Lowercase final path component of the key
    pub fn basename_lower(&self) -> &str {
        &self.basename_lower
    }

    /// Format declared by the key's extension
    pub fn format(&self) -> TagImageFormat {
        self.format
    }

    /// Width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Raw RGBA pixel data
    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

impl fmt::Debug for TagImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TagImage")
            .field("key", &self.key)
            .field("format", &self.format)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .finish_non_exhaustive()
    }
}
