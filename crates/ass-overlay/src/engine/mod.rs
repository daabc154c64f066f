//! Subtitle engine capability interface
//!
//! Glyph shaping and layout are delegated to an external engine. The
//! overlay only needs a handful of operations from it: create a renderer,
//! parse a script into a track, configure fonts and frame size, render a
//! timestamp into a list of image tiles, and (optionally) accept tag images.
//!
//! Optional engine features are exposed as probe methods returning
//! `Option`, never as null checks at call sites.

pub mod context;
#[cfg(feature = "libass")]
pub mod libass;
#[cfg(feature = "libass")]
mod libass_ffi;

pub use context::EngineContext;
#[cfg(feature = "libass")]
pub use libass::LibassEngine;

pub use crate::config::FontSettings;

use crate::tag_images::TagImage;
use crate::utils::OverlayError;

/// An external subtitle rendering engine
pub trait SubtitleEngine: Send + Sync + 'static {
    /// Parsed script owned by the engine
    type Track: Send;
    /// Renderer instance producing image tiles
    type Renderer: EngineRenderer<Self::Track>;

    /// Human readable engine name for diagnostics
    fn name(&self) -> &str;

    /// Allocate a renderer; this may be slow when it builds a font index
    fn create_renderer(&self) -> Result<Self::Renderer, OverlayError>;

    /// Parse a complete script held in memory
    fn read_track(&self, data: &[u8]) -> Result<Self::Track, OverlayError>;

    /// Whether mutating calls may run concurrently on different objects
    fn is_thread_safe(&self) -> bool {
        true
    }
}

/// Renderer side of an engine
pub trait EngineRenderer<T>: Send + 'static {
    /// Scale applied to every font size
    fn set_font_scale(&mut self, scale: f64);

    /// Configure default font substitution
    fn set_fonts(&mut self, fonts: &FontSettings);

    /// Size of the output frame in pixels
    fn set_frame_size(&mut self, width: u32, height: u32);

    /// Size of the source video storage in pixels
    fn set_storage_size(&mut self, width: u32, height: u32);

    /// Render `track` at `now_ms`
    fn render_frame(&mut self, track: &mut T, now_ms: i64) -> RenderResult<'_>;

    /// Tag-image extension, when the engine provides one
    fn tag_images(&mut self) -> Option<&mut dyn TagImageSink> {
        None
    }

    /// Apply font scale and substitution to a freshly created renderer
    fn configure(&mut self, fonts: &FontSettings) {
        self.set_font_scale(fonts.font_scale);
        self.set_fonts(fonts);
    }
}

/// Engine extension accepting externally decoded images
pub trait TagImageSink {
    /// Drop every registered image
    fn clear_tag_images(&mut self);

    /// Register `image` under `key`
    fn set_tag_image(&mut self, key: &str, image: &TagImage) -> Result<(), OverlayError>;
}

/// How much the rendered output differs from the previous call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameChange {
    /// Identical images
    #[default]
    Unchanged,
    /// Same content at different positions
    Moved,
    /// Different content
    Changed,
}

impl FrameChange {
    /// Map an engine's numeric change code
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Unchanged,
            1 => Self::Moved,
            _ => Self::Changed,
        }
    }
}

/// Premultiplied RGBA tile
#[derive(Debug, Clone, Copy)]
pub struct RgbaTile<'a> {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row
    pub stride: usize,
    /// Horizontal placement in the frame
    pub dst_x: i32,
    /// Vertical placement in the frame
    pub dst_y: i32,
    /// Pixel data, `stride * height` bytes
    pub rgba: &'a [u8],
}

/// 8-bit coverage tile drawn in a single color
#[derive(Debug, Clone, Copy)]
pub struct MaskTile<'a> {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row
    pub stride: usize,
    /// Horizontal placement in the frame
    pub dst_x: i32,
    /// Vertical placement in the frame
    pub dst_y: i32,
    /// Packed `0xRRGGBBTT` color, `TT` being transparency
    pub color: u32,
    /// Coverage values, `stride * height` bytes
    pub bitmap: &'a [u8],
}

/// Heap-allocated RGBA image list handed out by an engine
///
/// Dropping the list releases the engine allocation.
pub trait RgbaImageList {
    /// Tiles in drawing order
    fn tiles(&self) -> Vec<RgbaTile<'_>>;
}

/// RGBA tile owning its pixels
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnedRgbaTile {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Bytes per row
    pub stride: usize,
    /// Horizontal placement in the frame
    pub dst_x: i32,
    /// Vertical placement in the frame
    pub dst_y: i32,
    /// Premultiplied RGBA pixels
    pub rgba: Vec<u8>,
}

impl OwnedRgbaTile {
    /// Tightly packed tile at `(dst_x, dst_y)`
    pub fn new(width: u32, height: u32, dst_x: i32, dst_y: i32, rgba: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width as usize * 4,
            dst_x,
            dst_y,
            rgba,
        }
    }
}

/// RGBA image list for engines implemented in Rust
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedRgbaImages {
    tiles: Vec<OwnedRgbaTile>,
}

impl OwnedRgbaImages {
    /// Wrap tiles in drawing order
    pub fn new(tiles: Vec<OwnedRgbaTile>) -> Self {
        Self { tiles }
    }
}

impl RgbaImageList for OwnedRgbaImages {
    fn tiles(&self) -> Vec<RgbaTile<'_>> {
        self.tiles
            .iter()
            .map(|tile| RgbaTile {
                width: tile.width,
                height: tile.height,
                stride: tile.stride,
                dst_x: tile.dst_x,
                dst_y: tile.dst_y,
                rgba: &tile.rgba,
            })
            .collect()
    }
}

/// Raw output of one render call
pub struct RenderResult<'r> {
    /// Legacy coverage tiles, owned by the engine
    pub masks: Vec<MaskTile<'r>>,
    /// Premultiplied RGBA list, released when dropped
    pub rgba: Option<Box<dyn RgbaImageList + 'r>>,
    /// Whether the RGBA list is authoritative
    pub use_rgba: bool,
    /// Change relative to the previous render
    pub changed: FrameChange,
}

impl<'r> RenderResult<'r> {
    /// Result carrying only coverage tiles
    pub fn masks(masks: Vec<MaskTile<'r>>) -> Self {
        Self {
            masks,
            rgba: None,
            use_rgba: false,
            changed: FrameChange::Changed,
        }
    }

    /// Result carrying an authoritative RGBA list
    pub fn rgba(list: Box<dyn RgbaImageList + 'r>) -> Self {
        Self {
            masks: Vec::new(),
            rgba: Some(list),
            use_rgba: true,
            changed: FrameChange::Changed,
        }
    }

    /// Select the authoritative representation
    ///
    /// An RGBA list that is not selected is dropped here.
    pub fn into_images(self) -> RenderedImages<'r> {
        match self.rgba {
            Some(list) if self.use_rgba => RenderedImages::Rgba(list),
            _ => RenderedImages::Mask(self.masks),
        }
    }
}

impl std::fmt::Debug for RenderResult<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderResult")
            .field("masks", &self.masks.len())
            .field("rgba", &self.rgba.is_some())
            .field("use_rgba", &self.use_rgba)
            .field("changed", &self.changed)
            .finish()
    }
}

/// The single image representation used for one draw
pub enum RenderedImages<'r> {
    /// Premultiplied RGBA tiles
    Rgba(Box<dyn RgbaImageList + 'r>),
    /// Coverage tiles with packed colors
    Mask(Vec<MaskTile<'r>>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountedList(Arc<AtomicUsize>);

    impl RgbaImageList for CountedList {
        fn tiles(&self) -> Vec<RgbaTile<'_>> {
            Vec::new()
        }
    }

    impl Drop for CountedList {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn rgba_wins_only_when_flagged() {
        let released = Arc::new(AtomicUsize::new(0));
        let mut result = RenderResult::rgba(Box::new(CountedList(released.clone())));
        result.use_rgba = false;

        assert!(matches!(result.into_images(), RenderedImages::Mask(_)));
        assert_eq!(released.load(Ordering::SeqCst), 1);

        let result = RenderResult::rgba(Box::new(CountedList(released.clone())));
        let images = result.into_images();
        assert!(matches!(images, RenderedImages::Rgba(_)));
        drop(images);
        assert_eq!(released.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn flag_without_list_falls_back_to_masks() {
        let bitmap = [255u8];
        let mut result = RenderResult::masks(vec![MaskTile {
            width: 1,
            height: 1,
            stride: 1,
            dst_x: 0,
            dst_y: 0,
            color: 0,
            bitmap: &bitmap,
        }]);
        result.use_rgba = true;

        match result.into_images() {
            RenderedImages::Mask(tiles) => assert_eq!(tiles.len(), 1),
            RenderedImages::Rgba(_) => panic!("expected mask tiles"),
        };
    }

    #[test]
    fn owned_images_expose_tiles_in_order() {
        let images = OwnedRgbaImages::new(vec![
            OwnedRgbaTile::new(1, 1, 0, 0, vec![1, 2, 3, 255]),
            OwnedRgbaTile::new(2, 1, 5, -1, vec![0; 8]),
        ]);
        let tiles = images.tiles();
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles[1].stride, 8);
        assert_eq!(tiles[1].dst_y, -1);
    }

    #[test]
    fn change_codes() {
        assert_eq!(FrameChange::from_code(0), FrameChange::Unchanged);
        assert_eq!(FrameChange::from_code(1), FrameChange::Moved);
        assert_eq!(FrameChange::from_code(2), FrameChange::Changed);
    }
}
