use std::sync::{Arc, Mutex};

use super::events::AppEvent;

/// Receiver side of application events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AppEvent);
}

/// Emit an application event to the presentation layer
pub fn emit_event(sink: &dyn EventSink, event: AppEvent) {
    tracing::trace!(?event, "emitting event");
    sink.emit(event);
}

/// Sink that keeps every event in memory, in emission order
#[derive(Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<AppEvent>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AppEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn take(&self) -> Vec<AppEvent> {
        match self.events.lock() {
            Ok(mut guard) => std::mem::take(&mut *guard),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: AppEvent) {
        let mut events = match self.events.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("[MemorySink] Mutex poisoned, recovering...");
                poisoned.into_inner()
            }
        };
        events.push(event);
    }
}
