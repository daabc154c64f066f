//! Host application collaborator for blocking waits
//!
//! Waiting for the warm-up may need a user-visible, cancellable progress
//! indicator, and that indicator usually has to run on the host's primary
//! (UI) thread. The host supplies both through [`WaitHost`].

use std::thread::{self, ThreadId};

use parking_lot::Mutex;

/// Progress indicator shown while a caller waits
pub trait ProgressSink {
    /// Set the indicator title
    fn set_title(&self, title: &str);
    /// Set the indicator message
    fn set_message(&self, message: &str);
    /// Switch to an indeterminate (busy) display
    fn set_indeterminate(&self);
    /// Whether the user asked to stop waiting
    fn is_cancelled(&self) -> bool;
}

/// Primary-thread dispatch and progress display provided by the host
pub trait WaitHost: Send + Sync {
    /// Whether the current thread is the primary thread
    fn is_primary_thread(&self) -> bool;

    /// Run `task` on the primary thread, blocking until it returns
    fn run_on_primary(&self, task: &mut (dyn FnMut() + Send));

    /// Run `task` while displaying a progress indicator, blocking until it returns
    fn run_with_progress(&self, task: &mut dyn FnMut(&dyn ProgressSink));
}

/// Host for applications without an event loop
///
/// The primary thread is the one that created the host. Work marshalled
/// from other threads runs inline on the calling thread, one task at a
/// time. Progress is written to the log and can never be cancelled.
#[derive(Debug)]
pub struct HeadlessHost {
    primary: ThreadId,
    primary_lock: Mutex<()>,
}

impl HeadlessHost {
    /// Adopt the current thread as primary
    pub fn new() -> Self {
        Self {
            primary: thread::current().id(),
            primary_lock: Mutex::new(()),
        }
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl WaitHost for HeadlessHost {
    fn is_primary_thread(&self) -> bool {
        thread::current().id() == self.primary
    }

    fn run_on_primary(&self, task: &mut (dyn FnMut() + Send)) {
        let _primary = self.primary_lock.lock();
        task();
    }

    fn run_with_progress(&self, task: &mut dyn FnMut(&dyn ProgressSink)) {
        task(&LogProgress);
    }
}

struct LogProgress;

impl ProgressSink for LogProgress {
    fn set_title(&self, title: &str) {
        log::info!("{title}");
    }

    fn set_message(&self, message: &str) {
        log::info!("{message}");
    }

    fn set_indeterminate(&self) {}

    fn is_cancelled(&self) -> bool {
        false
    }
}
