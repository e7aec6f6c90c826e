//! Single-shot delayed callback running on the tokio runtime.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Duration, Instant};

/// Fires a callback once after a delay unless disposed first.
///
/// Must be created from within a tokio runtime. Dropping the timer disposes
/// of it.
#[derive(Debug)]
pub struct Timer {
    fire_at: Instant,
    disposed: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

impl Timer {
    /// Schedule `callback` to run once `delay` has elapsed.
    pub fn start<F>(delay: Duration, callback: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let fire_at = Instant::now() + delay;
        let disposed = Arc::new(AtomicBool::new(false));
        let flag = disposed.clone();
        let handle = tokio::spawn(async move {
            sleep_until(fire_at).await;
            if !flag.load(Ordering::SeqCst) {
                callback();
            }
        });
        Self {
            fire_at,
            disposed,
            handle,
        }
    }

    /// Time left until the callback is due, in milliseconds. Goes negative
    /// once the due moment has passed.
    pub fn remaining_millis(&self) -> i64 {
        let now = Instant::now();
        if self.fire_at >= now {
            (self.fire_at - now).as_millis() as i64
        } else {
            -((now - self.fire_at).as_millis() as i64)
        }
    }

    /// Whole seconds left, truncated toward zero.
    pub fn remaining_seconds(&self) -> i64 {
        self.remaining_millis() / 1000
    }

    /// Prevent the callback from running if it hasn't yet. Idempotent.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
        self.handle.abort();
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.dispose();
    }
}
