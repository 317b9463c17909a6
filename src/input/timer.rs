//! Single-slot delayed task with cancel-on-rearm.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Holds at most one pending delayed action. Scheduling replaces (aborts)
/// any previously pending one, so timers driven off repeated events never
/// stack. Dropping the slot aborts whatever is pending.
pub struct DelayedTask {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl DelayedTask {
    pub fn new() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    /// Run `action` after `delay`, replacing any pending action.
    pub fn schedule<F>(&self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        });
        let mut slot = self.handle.lock().expect("timer slot poisoned");
        if let Some(old) = slot.replace(task) {
            old.abort();
        }
    }

    /// Abort the pending action, if any.
    pub fn cancel(&self) {
        let mut slot = self.handle.lock().expect("timer slot poisoned");
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}

impl Default for DelayedTask {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for DelayedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
