//! Destination video frame

use crate::utils::OverlayError;

/// Borrowed BGRA video frame, composited in place
///
/// The buffer is tightly packed, 4 bytes per pixel in B, G, R, A order.
/// A flipped frame stores its rows bottom-up.
#[derive(Debug)]
pub struct VideoFrame<'a> {
    data: &'a mut [u8],
    width: u32,
    height: u32,
    flipped: bool,
}

impl<'a> VideoFrame<'a> {
    /// Wrap a caller-owned buffer of `width * height * 4` bytes
    pub fn new(data: &'a mut [u8], width: u32, height: u32) -> Result<Self, OverlayError> {
        if width == 0 || height == 0 {
            return Err(OverlayError::InvalidDimensions);
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(OverlayError::InvalidBufferSize {
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            data,
            width,
            height,
            flipped: false,
        })
    }

    /// Mark the rows as stored bottom-up
    #[must_use]
    pub fn flipped(mut self, flipped: bool) -> Self {
        self.flipped = flipped;
        self
    }

    /// Get frame width
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get frame height
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether rows are stored bottom-up
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Get stride (bytes per row)
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Get frame buffer data
    pub fn data(&self) -> &[u8] {
        self.data
    }

    /// Pixel row `y` in display order (row 0 is the top of the picture)
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let physical = if self.flipped {
            self.height - 1 - y
        } else {
            y
        };
        let stride = self.stride();
        let start = physical as usize * stride;
        &mut self.data[start..start + stride]
    }

    /// BGRA pixel at `(x, y)` in display order
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let physical = if self.flipped {
            self.height - 1 - y
        } else {
            y
        };
        let offset = physical as usize * self.stride() + x as usize * 4;
        let mut out = [0; 4];
        out.copy_from_slice(&self.data[offset..offset + 4]);
        out
    }
}
