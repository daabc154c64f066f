//! Blending engine output onto video frames
//!
//! Engines return either premultiplied RGBA tiles or 8-bit coverage tiles
//! with one packed color each. The representation is chosen once per draw
//! and every tile is blended over the frame in list order. Tiles are clipped
//! to the frame; the frame's alpha channel is always written as zero.

mod frame;

pub use frame::VideoFrame;

use crate::engine::{MaskTile, RenderedImages, RgbaTile};

/// Blend whichever representation the engine produced
///
/// Returns the number of tiles that touched the frame. The RGBA list is
/// released when this returns.
pub fn composite(frame: &mut VideoFrame<'_>, images: RenderedImages<'_>) -> usize {
    match images {
        RenderedImages::Rgba(list) => composite_rgba(frame, &list.tiles()),
        RenderedImages::Mask(tiles) => composite_mask(frame, &tiles),
    }
}

/// Blend premultiplied RGBA tiles: `dst = src + dst * (255 - a) / 255`
pub fn composite_rgba(frame: &mut VideoFrame<'_>, tiles: &[RgbaTile<'_>]) -> usize {
    let mut drawn = 0;
    for tile in tiles {
        let placement = Placement {
            width: tile.width,
            height: tile.height,
            stride: tile.stride,
            dst_x: tile.dst_x,
            dst_y: tile.dst_y,
        };
        let Some(clip) = placement.clip(frame, tile.rgba.len(), 4) else {
            continue;
        };

        for row in 0..clip.rows {
            let src_start = (clip.src_y + row) * tile.stride + clip.src_x * 4;
            let src = &tile.rgba[src_start..src_start + clip.cols * 4];
            let dst_row = frame.row_mut((clip.dst_y + row) as u32);
            let dst = &mut dst_row[clip.dst_x * 4..(clip.dst_x + clip.cols) * 4];

            for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
                let inv_alpha = 255 - u32::from(s[3]);
                d[0] = over(s[2], d[0], inv_alpha);
                d[1] = over(s[1], d[1], inv_alpha);
                d[2] = over(s[0], d[2], inv_alpha);
                d[3] = 0;
            }
        }
        drawn += 1;
    }
    drawn
}

/// Blend coverage tiles in their packed `0xRRGGBBTT` color
pub fn composite_mask(frame: &mut VideoFrame<'_>, tiles: &[MaskTile<'_>]) -> usize {
    let mut drawn = 0;
    for tile in tiles {
        let placement = Placement {
            width: tile.width,
            height: tile.height,
            stride: tile.stride,
            dst_x: tile.dst_x,
            dst_y: tile.dst_y,
        };
        let Some(clip) = placement.clip(frame, tile.bitmap.len(), 1) else {
            continue;
        };

        let opacity = 255 - (tile.color & 0xFF);
        let r = tile.color >> 24;
        let g = (tile.color >> 16) & 0xFF;
        let b = (tile.color >> 8) & 0xFF;

        for row in 0..clip.rows {
            let src_start = (clip.src_y + row) * tile.stride + clip.src_x;
            let src = &tile.bitmap[src_start..src_start + clip.cols];
            let dst_row = frame.row_mut((clip.dst_y + row) as u32);
            let dst = &mut dst_row[clip.dst_x * 4..(clip.dst_x + clip.cols) * 4];

            for (d, &coverage) in dst.chunks_exact_mut(4).zip(src) {
                let k = u32::from(coverage) * opacity / 255;
                let ck = 255 - k;
                d[0] = ((k * b + ck * u32::from(d[0])) / 255) as u8;
                d[1] = ((k * g + ck * u32::from(d[1])) / 255) as u8;
                d[2] = ((k * r + ck * u32::from(d[2])) / 255) as u8;
                d[3] = 0;
            }
        }
        drawn += 1;
    }
    drawn
}

#[inline]
fn over(src: u8, dst: u8, inv_alpha: u32) -> u8 {
    (u32::from(src) + u32::from(dst) * inv_alpha / 255).min(255) as u8
}

/// Tile geometry shared by both representations
struct Placement {
    width: u32,
    height: u32,
    stride: usize,
    dst_x: i32,
    dst_y: i32,
}

/// Visible part of a tile, in source and display coordinates
#[derive(Debug, PartialEq, Eq)]
struct Clip {
    src_x: usize,
    src_y: usize,
    dst_x: usize,
    dst_y: usize,
    cols: usize,
    rows: usize,
}

impl Placement {
    /// Intersect with the frame, rejecting tiles whose buffer is too short
    fn clip(&self, frame: &VideoFrame<'_>, data_len: usize, bytes_per_pixel: usize) -> Option<Clip> {
        if self.width == 0 || self.height == 0 {
            return None;
        }
        let row_bytes = self.width as usize * bytes_per_pixel;
        let needed = self.stride * (self.height as usize - 1) + row_bytes;
        if self.stride < row_bytes || data_len < needed {
            log::debug!(
                "skipping malformed {}x{} tile: stride {} with {} bytes",
                self.width,
                self.height,
                self.stride,
                data_len
            );
            return None;
        }

        let (src_x, dst_x, cols) = span(self.dst_x, self.width, frame.width())?;
        let (src_y, dst_y, rows) = span(self.dst_y, self.height, frame.height())?;
        Some(Clip {
            src_x,
            src_y,
            dst_x,
            dst_y,
            cols,
            rows,
        })
    }
}

/// Overlap of `[offset, offset + len)` with `[0, limit)` as (source start,
/// destination start, length)
fn span(offset: i32, len: u32, limit: u32) -> Option<(usize, usize, usize)> {
    let start = i64::from(offset).max(0);
    let end = (i64::from(offset) + i64::from(len)).min(i64::from(limit));
    if end <= start {
        return None;
    }
    Some((
        (start - i64::from(offset)) as usize,
        start as usize,
        (end - start) as usize,
    ))
}
