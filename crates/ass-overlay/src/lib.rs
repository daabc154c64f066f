//! Real-time ASS subtitle overlays for video playback
//!
//! `ass-overlay` sits between a video player and an external subtitle
//! engine. The engine shapes and rasterizes text; this crate owns the parts
//! around it:
//!
//! - warming up the engine's renderer in the background and handing it out
//!   without stalling playback ([`renderer`])
//! - resolving `\img` tag references to decoded pixels from disk or from
//!   embedded attachments ([`tag_images`])
//! - blending the engine's image tiles onto BGRA video frames ([`compositor`])
//!
//! [`SubtitleRenderProvider`] combines them behind four operations: load,
//! prepare, draw and reinitialize.

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod compositor;
pub mod config;
pub mod engine;
pub mod paths;
pub mod provider;
pub mod renderer;
pub mod tag_images;
pub mod utils;

pub use compositor::VideoFrame;
pub use config::{FontSettings, ProviderConfig};
pub use engine::{
    EngineContext, EngineRenderer, MaskTile, OwnedRgbaImages, OwnedRgbaTile, RenderResult,
    RenderedImages, RgbaImageList, RgbaTile, SubtitleEngine, TagImageSink,
};
#[cfg(feature = "libass")]
pub use engine::LibassEngine;
pub use provider::SubtitleRenderProvider;
pub use renderer::{HeadlessHost, LifecycleState, ProgressSink, RendererLifecycle, WaitHost};
pub use tag_images::{
    Attachment, AttachmentGroup, ImageDecoder, StandardImageDecoder, TagImage, TagImageCache,
    TagImageFormat, TagScanMode,
};
pub use utils::OverlayError;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
