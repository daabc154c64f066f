//! Raw bindings to the subset of libass used by the overlay
//!
//! Requires libass to be installed on the system:
//! - macOS: brew install libass
//! - Ubuntu/Debian: apt-get install libass-dev
//! - Fedora: dnf install libass-devel

#![allow(unsafe_code)] // Required for FFI
#![allow(non_camel_case_types)]

use std::ffi::{c_void, CStr};
use std::os::raw::{c_char, c_double, c_int, c_longlong};

#[repr(C)]
pub struct ASS_Library {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ASS_Renderer {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ASS_Track {
    _private: [u8; 0],
}

#[repr(C)]
pub struct ASS_Image {
    pub w: c_int,
    pub h: c_int,
    pub stride: c_int,
    pub bitmap: *mut u8,
    pub color: u32,
    pub dst_x: c_int,
    pub dst_y: c_int,
    pub next: *mut ASS_Image,
    pub type_: c_int,
}

/// `va_list` is only forwarded, never read
pub type MessageCallback =
    unsafe extern "C" fn(level: c_int, fmt: *const c_char, args: *mut c_void, data: *mut c_void);

#[link(name = "ass")]
extern "C" {
    pub fn ass_library_init() -> *mut ASS_Library;
    pub fn ass_library_done(library: *mut ASS_Library);
    pub fn ass_set_message_cb(
        library: *mut ASS_Library,
        callback: Option<MessageCallback>,
        data: *mut c_void,
    );

    pub fn ass_renderer_init(library: *mut ASS_Library) -> *mut ASS_Renderer;
    pub fn ass_renderer_done(renderer: *mut ASS_Renderer);
    pub fn ass_set_frame_size(renderer: *mut ASS_Renderer, w: c_int, h: c_int);
    pub fn ass_set_storage_size(renderer: *mut ASS_Renderer, w: c_int, h: c_int);
    pub fn ass_set_font_scale(renderer: *mut ASS_Renderer, font_scale: c_double);
    pub fn ass_set_fonts(
        renderer: *mut ASS_Renderer,
        default_font: *const c_char,
        default_family: *const c_char,
        dfp: c_int,
        config: *const c_char,
        update: c_int,
    );

    pub fn ass_read_memory(
        library: *mut ASS_Library,
        buf: *mut c_char,
        bufsize: usize,
        codepage: *const c_char,
    ) -> *mut ASS_Track;
    pub fn ass_free_track(track: *mut ASS_Track);

    pub fn ass_render_frame(
        renderer: *mut ASS_Renderer,
        track: *mut ASS_Track,
        now: c_longlong,
        detect_change: *mut c_int,
    ) -> *mut ASS_Image;
}

/// Route libass diagnostics into the `log` facade
///
/// Levels 7 and above are trace noise and dropped; below 2 are warnings and
/// errors. The format string is logged unexpanded.
pub unsafe extern "C" fn message_callback(
    level: c_int,
    fmt: *const c_char,
    _args: *mut c_void,
    _data: *mut c_void,
) {
    if level >= 7 || fmt.is_null() {
        return;
    }
    let message = CStr::from_ptr(fmt).to_string_lossy();
    let message = message.trim_end();
    if level < 2 {
        log::info!(target: "ass_overlay::libass", "{message}");
    } else {
        log::debug!(target: "ass_overlay::libass", "{message}");
    }
}
