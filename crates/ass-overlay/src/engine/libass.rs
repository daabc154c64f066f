//! Native libass backend
//!
//! Renders through the system libass. Output is always the coverage-tile
//! representation and no tag-image extension is available, so `\img`
//! references are reported once and otherwise ignored.

#![allow(unsafe_code)] // Required for FFI

use std::ffi::CString;
use std::os::raw::{c_char, c_int};
use std::ptr;
use std::sync::Arc;

use crate::config::FontSettings;
use crate::engine::libass_ffi::*;
use crate::engine::{EngineRenderer, FrameChange, MaskTile, RenderResult, SubtitleEngine};
use crate::utils::OverlayError;

/// Owned `ASS_Library`, shared by every renderer and track created from it
struct LibraryHandle {
    ptr: *mut ASS_Library,
}

// libass allows library objects to be used from any thread; renderers and
// tracks are never shared between threads without a lock.
unsafe impl Send for LibraryHandle {}
unsafe impl Sync for LibraryHandle {}

impl Drop for LibraryHandle {
    fn drop(&mut self) {
        unsafe {
            ass_library_done(self.ptr);
        }
    }
}

/// Subtitle engine backed by the system libass
pub struct LibassEngine {
    library: Arc<LibraryHandle>,
}

impl LibassEngine {
    /// Initialize libass
    ///
    /// # Errors
    ///
    /// [`OverlayError::EngineUnavailable`] if the library refuses to start.
    pub fn try_load() -> Result<Self, OverlayError> {
        let ptr = unsafe { ass_library_init() };
        if ptr.is_null() {
            return Err(OverlayError::EngineUnavailable(
                "ass_library_init returned null".into(),
            ));
        }
        unsafe {
            ass_set_message_cb(ptr, Some(message_callback), ptr::null_mut());
        }
        Ok(Self {
            library: Arc::new(LibraryHandle { ptr }),
        })
    }
}

impl SubtitleEngine for LibassEngine {
    type Track = LibassTrack;
    type Renderer = LibassRenderer;

    fn name(&self) -> &str {
        "libass"
    }

    fn create_renderer(&self) -> Result<LibassRenderer, OverlayError> {
        let ptr = unsafe { ass_renderer_init(self.library.ptr) };
        if ptr.is_null() {
            return Err(OverlayError::RendererInitFailed(
                "ass_renderer_init returned null".into(),
            ));
        }
        Ok(LibassRenderer {
            ptr,
            _library: Arc::clone(&self.library),
        })
    }

    fn read_track(&self, data: &[u8]) -> Result<LibassTrack, OverlayError> {
        // libass may modify the buffer while recoding it
        let mut buffer = data.to_vec();
        let ptr = unsafe {
            ass_read_memory(
                self.library.ptr,
                buffer.as_mut_ptr() as *mut c_char,
                buffer.len(),
                ptr::null(),
            )
        };
        if ptr.is_null() {
            return Err(OverlayError::ScriptRejected(
                "libass failed to load subtitles".into(),
            ));
        }
        Ok(LibassTrack {
            ptr,
            _library: Arc::clone(&self.library),
        })
    }
}

/// Parsed libass track
pub struct LibassTrack {
    ptr: *mut ASS_Track,
    _library: Arc<LibraryHandle>,
}

unsafe impl Send for LibassTrack {}

impl Drop for LibassTrack {
    fn drop(&mut self) {
        unsafe {
            ass_free_track(self.ptr);
        }
    }
}

/// libass renderer instance
pub struct LibassRenderer {
    ptr: *mut ASS_Renderer,
    _library: Arc<LibraryHandle>,
}

unsafe impl Send for LibassRenderer {}

impl Drop for LibassRenderer {
    fn drop(&mut self) {
        unsafe {
            ass_renderer_done(self.ptr);
        }
    }
}

fn optional_cstring(value: Option<&str>, what: &str) -> Option<CString> {
    let value = value?;
    match CString::new(value) {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("ignoring {what} containing a NUL byte");
            None
        }
    }
}

fn to_c_int(value: u32) -> c_int {
    c_int::try_from(value).unwrap_or(c_int::MAX)
}

impl EngineRenderer<LibassTrack> for LibassRenderer {
    fn set_font_scale(&mut self, scale: f64) {
        unsafe {
            ass_set_font_scale(self.ptr, scale);
        }
    }

    fn set_fonts(&mut self, fonts: &FontSettings) {
        let font = optional_cstring(fonts.default_font.as_deref(), "default font");
        let family = optional_cstring(Some(&fonts.default_family), "default family");
        let config = optional_cstring(fonts.fontconfig_path.as_deref(), "fontconfig path");
        let as_ptr = |value: &Option<CString>| value.as_ref().map_or(ptr::null(), |v| v.as_ptr());

        unsafe {
            ass_set_fonts(
                self.ptr,
                as_ptr(&font),
                as_ptr(&family),
                1,
                as_ptr(&config),
                c_int::from(fonts.update_cache),
            );
        }
    }

    fn set_frame_size(&mut self, width: u32, height: u32) {
        unsafe {
            ass_set_frame_size(self.ptr, to_c_int(width), to_c_int(height));
        }
    }

    fn set_storage_size(&mut self, width: u32, height: u32) {
        unsafe {
            ass_set_storage_size(self.ptr, to_c_int(width), to_c_int(height));
        }
    }

    fn render_frame(&mut self, track: &mut LibassTrack, now_ms: i64) -> RenderResult<'_> {
        let mut change: c_int = 0;
        let mut current = unsafe { ass_render_frame(self.ptr, track.ptr, now_ms, &mut change) };

        // The list stays owned by the renderer until the next render call,
        // which needs `&mut self` and therefore outlives these borrows.
        let mut masks = Vec::new();
        while !current.is_null() {
            let image = unsafe { &*current };
            current = image.next;

            if image.w <= 0 || image.h <= 0 || image.stride <= 0 || image.bitmap.is_null() {
                continue;
            }
            let stride = image.stride as usize;
            let len = stride * (image.h as usize - 1) + image.w as usize;
            let bitmap = unsafe { std::slice::from_raw_parts(image.bitmap as *const u8, len) };

            masks.push(MaskTile {
                width: image.w as u32,
                height: image.h as u32,
                stride,
                dst_x: image.dst_x,
                dst_y: image.dst_y,
                color: image.color,
                bitmap,
            });
        }

        let mut result = RenderResult::masks(masks);
        result.changed = FrameChange::from_code(change);
        result
    }
}
