//! Subtitle render provider facade
//!
//! Ties the pieces together for the host application: scripts are loaded
//! into the engine, their image references resolved, and each video frame
//! gets the rendered subtitles blended in.

use std::path::Path;
use std::sync::Arc;

use crate::compositor::{self, VideoFrame};
use crate::config::ProviderConfig;
use crate::engine::{EngineContext, EngineRenderer, SubtitleEngine};
use crate::renderer::{LifecycleState, RendererLifecycle, WaitHost};
use crate::tag_images::{Attachment, ImageDecoder, StandardImageDecoder, TagImageCache, TagScanMode};
use crate::utils::OverlayError;

/// Renders subtitle overlays onto video frames through a [`SubtitleEngine`]
///
/// Script loads and draws are expected to be serialized by the caller.
pub struct SubtitleRenderProvider<E: SubtitleEngine> {
    context: Arc<EngineContext<E>>,
    lifecycle: RendererLifecycle<E>,
    track: Option<E::Track>,
    tag_images: TagImageCache,
    scan_mode: TagScanMode,
}

impl<E: SubtitleEngine> SubtitleRenderProvider<E> {
    /// Create a provider and start warming up its renderer
    pub fn new(
        context: Arc<EngineContext<E>>,
        host: Arc<dyn WaitHost>,
        config: ProviderConfig,
    ) -> Result<Self, OverlayError> {
        Self::with_decoder(context, host, config, Arc::new(StandardImageDecoder))
    }

    /// Create a provider decoding tag images with `decoder`
    pub fn with_decoder(
        context: Arc<EngineContext<E>>,
        host: Arc<dyn WaitHost>,
        config: ProviderConfig,
        decoder: Arc<dyn ImageDecoder>,
    ) -> Result<Self, OverlayError> {
        let lifecycle = RendererLifecycle::spawn(Arc::clone(&context), host, &config)?;
        Ok(Self {
            context,
            lifecycle,
            track: None,
            tag_images: TagImageCache::new(decoder).with_directory_scan(config.directory_scan),
            scan_mode: config.scan_mode,
        })
    }

    /// Replace the active script
    ///
    /// # Errors
    ///
    /// [`OverlayError::ScriptRejected`] if the engine cannot parse `data`;
    /// the previous script stays active in that case.
    pub fn load_subtitles(&mut self, data: &[u8]) -> Result<(), OverlayError> {
        let track = self.context.read_track(data)?;
        self.track = Some(track);
        self.tag_images
            .set_referenced_paths(self.scan_mode.collect(data));
        log::debug!(
            "loaded {} bytes of subtitles with {} image references",
            data.len(),
            self.tag_images.referenced_paths().len()
        );
        Ok(())
    }

    /// Rebuild the attachment images and adopt the script's directory
    pub fn prepare_subtitles(&mut self, attachments: &[Attachment], base_dir: Option<&Path>) {
        self.tag_images.prepare(attachments, base_dir);
    }

    /// Render the active script at `time` seconds and blend it into `frame`
    ///
    /// Blocks while the renderer is still warming up. A cancelled wait
    /// leaves the frame untouched, as does drawing without a script.
    pub fn draw_subtitles(&mut self, frame: &mut VideoFrame<'_>, time: f64) -> Result<(), OverlayError> {
        let mut renderer = match self.lifecycle.acquire() {
            Ok(renderer) => renderer,
            Err(OverlayError::WarmupCancelled) => return Ok(()),
            Err(err) => return Err(err),
        };
        let Some(track) = self.track.as_mut() else {
            return Ok(());
        };

        push_tag_images::<E>(&self.context, &mut self.tag_images, &mut renderer);

        renderer.set_frame_size(frame.width(), frame.height());
        renderer.set_storage_size(frame.width(), frame.height());

        let now_ms = (time * 1000.0) as i64;
        let result = self.context.render_frame(&mut renderer, track, now_ms);
        let drawn = compositor::composite(frame, result.into_images());
        log::trace!("composited {drawn} tiles at {now_ms} ms");
        Ok(())
    }

    /// Recreate the renderer, e.g. after the font configuration changed
    ///
    /// Does nothing while the first warm-up is still running.
    pub fn reinitialize(&mut self) -> Result<(), OverlayError> {
        if self.lifecycle.reinitialize()? {
            self.tag_images.mark_dirty();
        }
        Ok(())
    }

    /// Renderer phase
    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    /// Whether a script is loaded
    pub fn has_subtitles(&self) -> bool {
        self.track.is_some()
    }

    /// Tag-image state of the active script
    pub fn tag_images(&self) -> &TagImageCache {
        &self.tag_images
    }

    /// Shared engine context
    pub fn context(&self) -> &Arc<EngineContext<E>> {
        &self.context
    }
}

impl<E: SubtitleEngine> std::fmt::Debug for SubtitleRenderProvider<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtitleRenderProvider")
            .field("lifecycle", &self.lifecycle)
            .field("has_subtitles", &self.track.is_some())
            .field("tag_images", &self.tag_images)
            .field("scan_mode", &self.scan_mode)
            .finish_non_exhaustive()
    }
}

/// Push pending tag-image registrations into the renderer
fn push_tag_images<E: SubtitleEngine>(
    context: &EngineContext<E>,
    cache: &mut TagImageCache,
    renderer: &mut E::Renderer,
) {
    if !cache.is_dirty() {
        return;
    }
    let Some(sink) = renderer.tag_images() else {
        context.report_missing_tag_images();
        cache.clear_dirty();
        return;
    };

    let registrations = cache.resolve_active();
    sink.clear_tag_images();
    let mut accepted = 0;
    for (key, image) in &registrations {
        match sink.set_tag_image(key, image) {
            Ok(()) => accepted += 1,
            Err(err) => log::debug!("engine rejected tag image {key}: {err}"),
        }
    }
    cache.clear_dirty();
    log::debug!("registered {accepted} of {} tag image keys", registrations.len());
}
