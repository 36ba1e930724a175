//! Trailing debounce.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// A cancellable trailing debouncer: each call supersedes the pending
/// one, so only the last call within the quiescence window runs.
#[derive(Debug)]
pub struct Debounce {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debounce {
    /// Debouncer with the given quiescence window.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Schedules `task`, cancelling any earlier pending call.
    pub fn call(&self, task: impl FnOnce() + Send + 'static) {
        let generation = Arc::clone(&self.generation);
        let scheduled = generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.delay;
        thread::spawn(move || {
            thread::sleep(delay);
            if generation.load(Ordering::SeqCst) == scheduled {
                task();
            }
        });
    }
}
