//! Image decoding adapter
//!
//! Turns an encoded image blob into straight RGBA pixels. The container
//! format is sniffed from the data itself; the extension-declared format
//! only decides whether a reference is eligible at all.

use std::path::Path;

use crate::tag_images::{TagImage, TagImageFormat};
use crate::utils::OverlayError;

/// Raw pixels produced by an [`ImageDecoder`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Tightly packed RGBA, `width * height * 4` bytes
    pub rgba: Vec<u8>,
}

/// Converts encoded image bytes to RGBA pixels
pub trait ImageDecoder: Send + Sync {
    /// Decode a complete image file held in memory
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, OverlayError>;
}

/// Decoder backed by the `image` crate (PNG, JPEG, WebP)
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardImageDecoder;

impl ImageDecoder for StandardImageDecoder {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage, OverlayError> {
        let image = image::load_from_memory(bytes)?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        if width == 0 || height == 0 {
            return Err(OverlayError::InvalidDimensions);
        }

        Ok(DecodedImage {
            width,
            height,
            rgba: rgba.into_raw(),
        })
    }
}

/// Decode in-memory bytes into a [`TagImage`] bound to `key`
pub fn decode_bytes(
    decoder: &dyn ImageDecoder,
    key: &str,
    format: TagImageFormat,
    bytes: &[u8],
) -> Result<TagImage, OverlayError> {
    if bytes.is_empty() {
        return Err(OverlayError::ImageDecode(format!("{key}: no image data")));
    }
    let decoded = decoder.decode(bytes)?;
    TagImage::new(key, format, decoded.width, decoded.height, decoded.rgba)
}

/// Read and decode an image file into a [`TagImage`] bound to `key`
pub fn decode_file(
    decoder: &dyn ImageDecoder,
    path: &Path,
    key: &str,
    format: TagImageFormat,
) -> Result<TagImage, OverlayError> {
    let bytes = std::fs::read(path)?;
    decode_bytes(decoder, key, format, &bytes)
}
