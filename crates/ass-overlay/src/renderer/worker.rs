//! Single-threaded background queue for warm-up jobs

use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Sender};
use std::thread;

use crate::utils::OverlayError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted jobs one at a time, in submission order, on a named thread
///
/// Dropping the queue closes it; jobs already submitted still run and the
/// thread exits on its own afterwards.
pub struct WarmupQueue {
    name: String,
    sender: Sender<Job>,
}

impl WarmupQueue {
    /// Start the worker thread
    pub fn spawn(name: impl Into<String>) -> io::Result<Self> {
        let name = name.into();
        let (sender, receiver) = channel::<Job>();
        let thread_name = name.clone();

        thread::Builder::new().name(name.clone()).spawn(move || {
            for job in receiver {
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    log::error!("job on {thread_name} panicked");
                }
            }
        })?;

        Ok(Self { name, sender })
    }

    /// Thread name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue a job behind any pending ones
    pub fn submit(&self, job: impl FnOnce() + Send + 'static) -> Result<(), OverlayError> {
        self.sender
            .send(Box::new(job))
            .map_err(|_| OverlayError::WorkerUnavailable(format!("{} has shut down", self.name)))
    }
}

impl std::fmt::Debug for WarmupQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarmupQueue")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}
