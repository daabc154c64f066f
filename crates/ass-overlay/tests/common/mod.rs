//! Shared fixtures: an in-memory subtitle engine and a scriptable host

#![allow(dead_code)]

use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, ThreadId};
use std::time::{Duration, Instant};

use ass_overlay::{
    EngineRenderer, FontSettings, MaskTile, OverlayError, OwnedRgbaImages, OwnedRgbaTile,
    ProgressSink, RenderResult, RgbaImageList, RgbaTile, SubtitleEngine, TagImage, TagImageSink,
    WaitHost,
};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Poll `condition` until it holds or five seconds pass
pub fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    condition()
}

/// Encode a solid-color PNG
pub fn png_bytes(width: u32, height: u32, pixel: [u8; 4]) -> Vec<u8> {
    let image = image::RgbaImage::from_pixel(width, height, image::Rgba(pixel));
    let mut out = Cursor::new(Vec::new());
    image
        .write_to(&mut out, image::ImageOutputFormat::Png)
        .expect("encode png");
    out.into_inner()
}

/// One-shot latch blocking renderer creation
#[derive(Default)]
pub struct Gate {
    open: Mutex<bool>,
    cv: Condvar,
}

impl Gate {
    pub fn closed() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn opened() -> Arc<Self> {
        let gate = Self::default();
        *gate.open.lock().unwrap() = true;
        Arc::new(gate)
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.cv.notify_all();
    }

    fn wait(&self) {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.cv.wait(open).unwrap();
        }
    }
}

/// Coverage tile owning its bitmap
#[derive(Debug, Clone)]
pub struct OwnedMask {
    pub width: u32,
    pub height: u32,
    pub dst_x: i32,
    pub dst_y: i32,
    pub color: u32,
    pub bitmap: Vec<u8>,
}

/// What every render call returns
#[derive(Debug, Clone, Default)]
pub struct Output {
    pub masks: Vec<OwnedMask>,
    pub rgba: Option<Vec<OwnedRgbaTile>>,
    pub use_rgba: bool,
}

/// Everything the fake engine observed
#[derive(Debug, Default)]
pub struct Recorder {
    pub events: Vec<String>,
    pub created: usize,
    pub tag_pushes: Vec<(usize, Vec<String>)>,
    pub frame_sizes: Vec<(u32, u32)>,
    pub storage_sizes: Vec<(u32, u32)>,
    pub render_times: Vec<i64>,
    pub fonts: Vec<(f64, FontSettings)>,
    pub rgba_released: usize,
    pub in_engine: usize,
    pub max_in_engine: usize,
}

pub struct FakeEngine {
    pub gate: Arc<Gate>,
    pub recorder: Arc<Mutex<Recorder>>,
    pub output: Arc<Mutex<Output>>,
    pub tag_support: bool,
    pub thread_safe: bool,
    pub fail_creation: bool,
    pub engine_delay: Duration,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self {
            gate: Gate::opened(),
            recorder: Arc::default(),
            output: Arc::default(),
            tag_support: true,
            thread_safe: true,
            fail_creation: false,
            engine_delay: Duration::ZERO,
        }
    }

    pub fn gated(gate: Arc<Gate>) -> Self {
        Self {
            gate,
            ..Self::new()
        }
    }

    pub fn without_tag_images(mut self) -> Self {
        self.tag_support = false;
        self
    }

    pub fn not_thread_safe(mut self, delay: Duration) -> Self {
        self.thread_safe = false;
        self.engine_delay = delay;
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_creation = true;
        self
    }

    fn enter(&self) {
        let mut recorder = self.recorder.lock().unwrap();
        recorder.in_engine += 1;
        recorder.max_in_engine = recorder.max_in_engine.max(recorder.in_engine);
    }

    fn leave(&self) {
        self.recorder.lock().unwrap().in_engine -= 1;
    }
}

pub struct FakeTrack {
    pub script: Vec<u8>,
}

impl SubtitleEngine for FakeEngine {
    type Track = FakeTrack;
    type Renderer = FakeRenderer;

    fn name(&self) -> &str {
        "fake"
    }

    fn create_renderer(&self) -> Result<FakeRenderer, OverlayError> {
        self.gate.wait();
        if self.fail_creation {
            return Err(OverlayError::RendererInitFailed("no fonts".into()));
        }

        let mut recorder = self.recorder.lock().unwrap();
        recorder.created += 1;
        let id = recorder.created;
        recorder.events.push(format!("create {id}"));
        Ok(FakeRenderer {
            id,
            recorder: Arc::clone(&self.recorder),
            output: Arc::clone(&self.output),
            tag_images: self.tag_support.then(|| FakeTagImages {
                id,
                keys: Vec::new(),
                recorder: Arc::clone(&self.recorder),
            }),
            rendered: Output::default(),
        })
    }

    fn read_track(&self, data: &[u8]) -> Result<FakeTrack, OverlayError> {
        self.enter();
        thread::sleep(self.engine_delay);
        self.leave();
        if data.is_empty() || data.starts_with(b"INVALID") {
            return Err(OverlayError::ScriptRejected("unparseable script".into()));
        }
        Ok(FakeTrack {
            script: data.to_vec(),
        })
    }

    fn is_thread_safe(&self) -> bool {
        self.thread_safe
    }
}

#[derive(Debug)]
pub struct FakeTagImages {
    id: usize,
    keys: Vec<String>,
    recorder: Arc<Mutex<Recorder>>,
}

impl TagImageSink for FakeTagImages {
    fn clear_tag_images(&mut self) {
        self.keys.clear();
        self.recorder
            .lock()
            .unwrap()
            .tag_pushes
            .push((self.id, Vec::new()));
    }

    fn set_tag_image(&mut self, key: &str, image: &TagImage) -> Result<(), OverlayError> {
        assert_eq!(image.rgba().len(), image.stride() * image.height() as usize);
        self.keys.push(key.to_owned());
        if let Some((_, keys)) = self.recorder.lock().unwrap().tag_pushes.last_mut() {
            keys.push(key.to_owned());
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct FakeRenderer {
    pub id: usize,
    recorder: Arc<Mutex<Recorder>>,
    output: Arc<Mutex<Output>>,
    tag_images: Option<FakeTagImages>,
    rendered: Output,
}

impl Drop for FakeRenderer {
    fn drop(&mut self) {
        if let Ok(mut recorder) = self.recorder.lock() {
            recorder.events.push(format!("drop {}", self.id));
        }
    }
}

/// RGBA list that records its release
struct TrackedImages {
    images: OwnedRgbaImages,
    recorder: Arc<Mutex<Recorder>>,
}

impl RgbaImageList for TrackedImages {
    fn tiles(&self) -> Vec<RgbaTile<'_>> {
        self.images.tiles()
    }
}

impl Drop for TrackedImages {
    fn drop(&mut self) {
        if let Ok(mut recorder) = self.recorder.lock() {
            recorder.rgba_released += 1;
        }
    }
}

impl EngineRenderer<FakeTrack> for FakeRenderer {
    fn set_font_scale(&mut self, scale: f64) {
        self.recorder
            .lock()
            .unwrap()
            .fonts
            .push((scale, FontSettings::default()));
    }

    fn set_fonts(&mut self, fonts: &FontSettings) {
        if let Some(last) = self.recorder.lock().unwrap().fonts.last_mut() {
            last.1 = fonts.clone();
        }
    }

    fn set_frame_size(&mut self, width: u32, height: u32) {
        self.recorder.lock().unwrap().frame_sizes.push((width, height));
    }

    fn set_storage_size(&mut self, width: u32, height: u32) {
        self.recorder
            .lock()
            .unwrap()
            .storage_sizes
            .push((width, height));
    }

    fn render_frame(&mut self, _track: &mut FakeTrack, now_ms: i64) -> RenderResult<'_> {
        self.recorder.lock().unwrap().render_times.push(now_ms);
        self.rendered = self.output.lock().unwrap().clone();

        let masks = self
            .rendered
            .masks
            .iter()
            .map(|mask| MaskTile {
                width: mask.width,
                height: mask.height,
                stride: mask.width as usize,
                dst_x: mask.dst_x,
                dst_y: mask.dst_y,
                color: mask.color,
                bitmap: &mask.bitmap,
            })
            .collect();

        let mut result = RenderResult::masks(masks);
        if let Some(tiles) = self.rendered.rgba.clone() {
            result.rgba = Some(Box::new(TrackedImages {
                images: OwnedRgbaImages::new(tiles),
                recorder: Arc::clone(&self.recorder),
            }));
        }
        result.use_rgba = self.rendered.use_rgba;
        result
    }

    fn tag_images(&mut self) -> Option<&mut dyn TagImageSink> {
        self.tag_images
            .as_mut()
            .map(|sink| sink as &mut dyn TagImageSink)
    }
}

/// Host whose primary thread is the test thread, counting progress waits
pub struct CountingHost {
    primary: ThreadId,
    primary_lock: Mutex<()>,
    pub progress_shown: AtomicUsize,
    pub cancel: AtomicBool,
    pub titles: Mutex<Vec<String>>,
}

impl CountingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            primary: thread::current().id(),
            primary_lock: Mutex::new(()),
            progress_shown: AtomicUsize::new(0),
            cancel: AtomicBool::new(false),
            titles: Mutex::new(Vec::new()),
        })
    }

    pub fn shown(&self) -> usize {
        self.progress_shown.load(Ordering::SeqCst)
    }
}

struct CountingProgress<'a> {
    host: &'a CountingHost,
}

impl ProgressSink for CountingProgress<'_> {
    fn set_title(&self, title: &str) {
        self.host.titles.lock().unwrap().push(title.to_owned());
    }

    fn set_message(&self, _message: &str) {}

    fn set_indeterminate(&self) {}

    fn is_cancelled(&self) -> bool {
        self.host.cancel.load(Ordering::SeqCst)
    }
}

impl WaitHost for CountingHost {
    fn is_primary_thread(&self) -> bool {
        thread::current().id() == self.primary
    }

    fn run_on_primary(&self, task: &mut (dyn FnMut() + Send)) {
        let _primary = self.primary_lock.lock().unwrap();
        task();
    }

    fn run_with_progress(&self, task: &mut dyn FnMut(&dyn ProgressSink)) {
        self.progress_shown.fetch_add(1, Ordering::SeqCst);
        task(&CountingProgress { host: self });
    }
}

/// Host that services other threads' primary-thread requests from inside
/// an open progress wait, the way an event loop keeps pumping while a
/// modal indicator is shown
///
/// A marshalled task runs on its requesting thread, but only while the
/// primary thread is parked inside `is_cancelled` waiting for it.
pub struct PumpHost {
    primary: ThreadId,
    pump: Mutex<PumpState>,
    cv: Condvar,
    pub progress_shown: AtomicUsize,
}

#[derive(Default)]
struct PumpState {
    tickets: usize,
    granted: usize,
    finished: usize,
}

impl PumpHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            primary: thread::current().id(),
            pump: Mutex::new(PumpState::default()),
            cv: Condvar::new(),
            progress_shown: AtomicUsize::new(0),
        })
    }

    pub fn shown(&self) -> usize {
        self.progress_shown.load(Ordering::SeqCst)
    }

    /// Number of marshalled tasks serviced so far
    pub fn pumped(&self) -> usize {
        self.pump.lock().unwrap().finished
    }

    /// Run every queued request to completion, one at a time
    fn pump_pending(&self) {
        let mut state = self.pump.lock().unwrap();
        while state.granted < state.tickets {
            state.granted += 1;
            let ticket = state.granted;
            self.cv.notify_all();
            while state.finished < ticket {
                state = self.cv.wait(state).unwrap();
            }
        }
    }
}

struct PumpProgress<'a> {
    host: &'a PumpHost,
}

impl ProgressSink for PumpProgress<'_> {
    fn set_title(&self, _title: &str) {}

    fn set_message(&self, _message: &str) {}

    fn set_indeterminate(&self) {}

    fn is_cancelled(&self) -> bool {
        self.host.pump_pending();
        false
    }
}

impl WaitHost for PumpHost {
    fn is_primary_thread(&self) -> bool {
        thread::current().id() == self.primary
    }

    fn run_on_primary(&self, task: &mut (dyn FnMut() + Send)) {
        if self.is_primary_thread() {
            task();
            return;
        }

        let mut state = self.pump.lock().unwrap();
        state.tickets += 1;
        let ticket = state.tickets;
        self.cv.notify_all();
        while state.granted < ticket {
            state = self.cv.wait(state).unwrap();
        }
        drop(state);

        task();

        self.pump.lock().unwrap().finished += 1;
        self.cv.notify_all();
    }

    fn run_with_progress(&self, task: &mut dyn FnMut(&dyn ProgressSink)) {
        self.progress_shown.fetch_add(1, Ordering::SeqCst);
        task(&PumpProgress { host: self });
    }
}
