//! Renderer warm-up and access
//!
//! Creating a renderer can take minutes the first time because the engine
//! builds its font index. The renderer is therefore created on the context's
//! warm-up queue and published through a ready flag. Callers that arrive
//! early wait briefly, then escalate to a cancellable progress wait on the
//! host's primary thread.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};

use crate::config::{FontSettings, ProviderConfig};
use crate::engine::{EngineContext, SubtitleEngine};
use crate::renderer::host::{ProgressSink, WaitHost};
use crate::utils::OverlayError;

/// Observable phase of a [`RendererLifecycle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Warm-up has not been submitted
    Uninitialized,
    /// Warm-up is running in the background
    Warming,
    /// A renderer is available
    Ready,
    /// The renderer is being replaced in place
    Reinitializing,
}

impl LifecycleState {
    fn to_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Warming => 1,
            Self::Ready => 2,
            Self::Reinitializing => 3,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Uninitialized,
            1 => Self::Warming,
            2 => Self::Ready,
            _ => Self::Reinitializing,
        }
    }
}

/// State shared between the lifecycle and its in-flight warm-up job
struct WarmupState<R> {
    ready: AtomicBool,
    phase: AtomicU8,
    renderer: Mutex<Option<R>>,
    failure: Mutex<Option<String>>,
}

impl<R> WarmupState<R> {
    fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            phase: AtomicU8::new(LifecycleState::Uninitialized.to_u8()),
            renderer: Mutex::new(None),
            failure: Mutex::new(None),
        }
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn failure(&self) -> Option<String> {
        self.failure.lock().clone()
    }

    /// Ready, or warm-up gave up
    fn is_settled(&self) -> bool {
        self.is_ready() || self.failure.lock().is_some()
    }

    fn set_phase(&self, phase: LifecycleState) {
        self.phase.store(phase.to_u8(), Ordering::Release);
    }

    fn publish(&self, renderer: R) {
        *self.renderer.lock() = Some(renderer);
        self.ready.store(true, Ordering::Release);
        self.set_phase(LifecycleState::Ready);
    }

    fn fail(&self, message: String) {
        *self.failure.lock() = Some(message);
    }
}

/// Owner of the single renderer of a provider
pub struct RendererLifecycle<E: SubtitleEngine> {
    context: Arc<EngineContext<E>>,
    host: Arc<dyn WaitHost>,
    shared: Arc<WarmupState<E::Renderer>>,
    waiting: AtomicBool,
    fonts: FontSettings,
    warmup_grace: Duration,
    poll_interval: Duration,
    progress_title: String,
    progress_message: String,
}

impl<E: SubtitleEngine> RendererLifecycle<E> {
    /// Create an idle lifecycle; warm-up starts with [`start`](Self::start)
    pub fn new(
        context: Arc<EngineContext<E>>,
        host: Arc<dyn WaitHost>,
        config: &ProviderConfig,
    ) -> Self {
        Self {
            context,
            host,
            shared: Arc::new(WarmupState::new()),
            waiting: AtomicBool::new(false),
            fonts: config.fonts.clone(),
            warmup_grace: config.warmup_grace,
            poll_interval: config.progress_poll_interval,
            progress_title: config.progress_title.clone(),
            progress_message: config.progress_message.clone(),
        }
    }

    /// Create a lifecycle and submit its warm-up immediately
    pub fn spawn(
        context: Arc<EngineContext<E>>,
        host: Arc<dyn WaitHost>,
        config: &ProviderConfig,
    ) -> Result<Self, OverlayError> {
        let lifecycle = Self::new(context, host, config);
        lifecycle.start()?;
        Ok(lifecycle)
    }

    /// Submit the warm-up job; later calls do nothing
    pub fn start(&self) -> Result<(), OverlayError> {
        let claimed = self
            .shared
            .phase
            .compare_exchange(
                LifecycleState::Uninitialized.to_u8(),
                LifecycleState::Warming.to_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if !claimed {
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let context = Arc::clone(&self.context);
        let fonts = self.fonts.clone();
        let submitted = self.context.queue().and_then(|queue| {
            queue.submit(move || {
                log::debug!("warming up {} renderer", context.engine().name());
                match context.create_renderer(&fonts) {
                    Ok(renderer) => {
                        shared.publish(renderer);
                        log::debug!("{} renderer ready", context.engine().name());
                    }
                    Err(err) => {
                        log::error!("{} renderer warm-up failed: {err}", context.engine().name());
                        shared.fail(err.to_string());
                    }
                }
            })
        });

        if let Err(err) = &submitted {
            self.shared.fail(err.to_string());
        }
        submitted
    }

    /// Current phase
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_u8(self.shared.phase.load(Ordering::Acquire))
    }

    /// Whether a renderer has been published
    pub fn is_ready(&self) -> bool {
        self.shared.is_ready()
    }

    /// Borrow the renderer, waiting for warm-up if necessary
    ///
    /// Never waits for warm-up once the renderer is ready, though the
    /// returned guard is exclusive: a caller still queues behind another
    /// thread that is drawing with the renderer or reinitializing it.
    /// Before readiness, the caller sleeps for the configured grace period
    /// and then waits behind a progress indicator on the primary thread.
    /// Concurrent and re-entrant callers share a single progress wait and
    /// poll for readiness while it is open; if that wait is cancelled they
    /// are cancelled too.
    ///
    /// # Errors
    ///
    /// [`OverlayError::WarmupCancelled`] if the user stopped waiting, or
    /// [`OverlayError::RendererInitFailed`] if no renderer could be created.
    pub fn acquire(&self) -> Result<MappedMutexGuard<'_, E::Renderer>, OverlayError> {
        if self.state() == LifecycleState::Uninitialized {
            self.start()?;
        }

        if !self.shared.is_ready() {
            self.wait_until_settled()?;
            if let Some(message) = self.shared.failure() {
                return Err(OverlayError::RendererInitFailed(message));
            }
        }

        MutexGuard::try_map(self.shared.renderer.lock(), |slot| slot.as_mut()).map_err(|_| {
            OverlayError::RendererInitFailed(format!(
                "{} renderer is not available",
                self.context.engine().name()
            ))
        })
    }

    /// Replace the renderer with a freshly configured one
    ///
    /// Does nothing and returns `false` while the first warm-up is still
    /// running. The old renderer is destroyed before its replacement is
    /// created; draws holding the renderer finish first.
    pub fn reinitialize(&self) -> Result<bool, OverlayError> {
        if !self.shared.is_ready() {
            log::debug!("reinitialize skipped, warm-up still in progress");
            return Ok(false);
        }

        let mut slot = self.shared.renderer.lock();
        self.shared.set_phase(LifecycleState::Reinitializing);
        drop(slot.take());

        let created = self.context.create_renderer(&self.fonts);
        self.shared.set_phase(LifecycleState::Ready);
        *slot = Some(created?);
        log::debug!("{} renderer reinitialized", self.context.engine().name());
        Ok(true)
    }

    fn wait_until_settled(&self) -> Result<(), OverlayError> {
        let mut cancelled = false;
        let mut block = || {
            if self.shared.is_settled() {
                return;
            }
            thread::sleep(self.warmup_grace);
            if self.shared.is_settled() {
                return;
            }

            // Hosts may run this block re-entrantly while pumping events
            // inside an open progress wait, so no lock is held across it.
            let Some(_owner) = WaitOwner::claim(&self.waiting) else {
                while !self.shared.is_settled() && self.waiting.load(Ordering::Acquire) {
                    thread::sleep(self.poll_interval);
                }
                cancelled = !self.shared.is_settled();
                return;
            };

            self.host
                .run_with_progress(&mut |progress: &dyn ProgressSink| {
                    progress.set_title(&self.progress_title);
                    progress.set_message(&self.progress_message);
                    progress.set_indeterminate();
                    while !self.shared.is_settled() && !progress.is_cancelled() {
                        thread::sleep(self.poll_interval);
                    }
                });
            cancelled = !self.shared.is_settled();
        };

        if self.host.is_primary_thread() {
            block();
        } else {
            self.host.run_on_primary(&mut block);
        }

        if cancelled {
            log::debug!("renderer warm-up wait cancelled");
            return Err(OverlayError::WarmupCancelled);
        }
        Ok(())
    }
}

/// Ownership of the single progress wait, released on drop
struct WaitOwner<'a> {
    flag: &'a AtomicBool,
}

impl<'a> WaitOwner<'a> {
    fn claim(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for WaitOwner<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

impl<E: SubtitleEngine> std::fmt::Debug for RendererLifecycle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RendererLifecycle")
            .field("engine", &self.context.engine().name())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}
