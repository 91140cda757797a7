use std::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Trailing-edge debouncer
///
/// Every `schedule` call cancels the pending timer and arms a new one; only the
/// last action scheduled before a quiet interval of `quiet` runs.
/// Must be used from within a tokio runtime.
pub struct Debouncer {
    quiet: Duration,
    pending: Mutex<Option<JoinHandle<()>>>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: Mutex::new(None),
        }
    }

    /// Cancel any pending action and arm the timer for `action`
    pub fn schedule<F>(&self, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let quiet = self.quiet;
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("[Debouncer] Mutex poisoned, recovering...");
                poisoned.into_inner()
            }
        };

        if let Some(previous) = pending.take() {
            previous.abort();
        }

        *pending = Some(tokio::spawn(async move {
            sleep(quiet).await;
            action();
        }));
    }

    /// Drop the pending action, if any
    pub fn cancel(&self) {
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(previous) = pending.take() {
            previous.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        let pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        pending.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
