//! Owned engine context
//!
//! Everything that would otherwise be process-global state for an engine
//! lives here: the engine itself, the background warm-up queue, the lock
//! serializing engines that are not thread-safe, and one-shot diagnostics.
//! Providers share a context through an `Arc`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, MutexGuard};

use crate::config::FontSettings;
use crate::engine::{EngineRenderer, RenderResult, SubtitleEngine};
use crate::renderer::worker::WarmupQueue;
use crate::utils::OverlayError;

/// Shared state for one subtitle engine
pub struct EngineContext<E> {
    engine: E,
    queue: OnceLock<Result<WarmupQueue, String>>,
    engine_lock: Mutex<()>,
    missing_tag_images_reported: AtomicBool,
}

impl<E: SubtitleEngine> EngineContext<E> {
    /// Wrap a loaded engine
    pub fn new(engine: E) -> Arc<Self> {
        Arc::new(Self {
            engine,
            queue: OnceLock::new(),
            engine_lock: Mutex::new(()),
            missing_tag_images_reported: AtomicBool::new(false),
        })
    }

    /// The wrapped engine
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Background queue for warm-up work, started on first use
    pub fn queue(&self) -> Result<&WarmupQueue, OverlayError> {
        let name = format!("{}-warmup", self.engine.name());
        self.queue
            .get_or_init(|| WarmupQueue::spawn(name).map_err(|err| err.to_string()))
            .as_ref()
            .map_err(|err| OverlayError::WorkerUnavailable(err.clone()))
    }

    /// Hold the engine lock if the engine requires serialization
    pub fn serialize(&self) -> Option<MutexGuard<'_, ()>> {
        (!self.engine.is_thread_safe()).then(|| self.engine_lock.lock())
    }

    /// Create a renderer and apply `fonts` to it
    pub fn create_renderer(&self, fonts: &FontSettings) -> Result<E::Renderer, OverlayError> {
        let _guard = self.serialize();
        let mut renderer = self.engine.create_renderer()?;
        renderer.configure(fonts);
        Ok(renderer)
    }

    /// Parse a script buffer into a track
    pub fn read_track(&self, data: &[u8]) -> Result<E::Track, OverlayError> {
        let _guard = self.serialize();
        self.engine.read_track(data)
    }

    /// Render `track` at `now_ms`
    pub fn render_frame<'r>(
        &self,
        renderer: &'r mut E::Renderer,
        track: &mut E::Track,
        now_ms: i64,
    ) -> RenderResult<'r> {
        let _guard = self.serialize();
        renderer.render_frame(track, now_ms)
    }

    /// Report a missing tag-image extension once per context
    ///
    /// Returns whether this call emitted the report.
    pub fn report_missing_tag_images(&self) -> bool {
        let first = !self.missing_tag_images_reported.swap(true, Ordering::AcqRel);
        if first {
            log::warn!(
                "{} has no tag-image support; \\img references will not be drawn",
                self.engine.name()
            );
        }
        first
    }

    /// Prime the engine's font cache in the background
    ///
    /// A throwaway renderer is created and configured on the warm-up queue
    /// so that later renderers find an up-to-date font index.
    pub fn cache_fonts(self: &Arc<Self>, fonts: FontSettings) -> Result<(), OverlayError> {
        let context = Arc::clone(self);
        self.queue()?.submit(move || match context.create_renderer(&fonts) {
            Ok(renderer) => {
                drop(renderer);
                log::debug!("{} font cache primed", context.engine.name());
            }
            Err(err) => log::info!("{} font cache priming failed: {err}", context.engine.name()),
        })
    }
}

impl<E: SubtitleEngine> std::fmt::Debug for EngineContext<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineContext")
            .field("engine", &self.engine.name())
            .field("thread_safe", &self.engine.is_thread_safe())
            .field("queue_started", &self.queue.get().is_some())
            .finish_non_exhaustive()
    }
}
