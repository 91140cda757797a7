//! Conversion orchestrator
//!
//! Runs one request/response cycle against the backend per call and owns the
//! state that cycle touches: the output text, the busy flag and the history.
//! Calls are not serialized against each other; when two conversions overlap,
//! whichever finishes last decides the output.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::client::BackendClient;
use super::markup::strip_markup;
use crate::core::history::HistoryCache;
use crate::shared::emit::{emit_event, EventSink};
use crate::shared::error::{AppError, AppResult};
use crate::shared::events::AppEvent;
use crate::shared::types::{ConversionRecord, ConversionRequest, LanguageLabel};

pub const NO_EXPLANATION: &str = "No explanation returned.";

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("[Orchestrator] Mutex poisoned, recovering...");
            poisoned.into_inner()
        }
    }
}

/// Marks the orchestrator busy for its lifetime
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
    sink: &'a dyn EventSink,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool, sink: &'a dyn EventSink) -> Self {
        flag.store(true, Ordering::SeqCst);
        emit_event(sink, AppEvent::BusyChanged(true));
        Self { flag, sink }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        emit_event(self.sink, AppEvent::BusyChanged(false));
    }
}

pub struct ConversionOrchestrator {
    backend: Arc<dyn BackendClient>,
    history: Mutex<HistoryCache>,
    sink: Arc<dyn EventSink>,
    output: Mutex<String>,
    busy: AtomicBool,
}

impl ConversionOrchestrator {
    pub fn new(backend: Arc<dyn BackendClient>, history: HistoryCache, sink: Arc<dyn EventSink>) -> Self {
        Self {
            backend,
            history: Mutex::new(history),
            sink,
            output: Mutex::new(String::new()),
            busy: AtomicBool::new(false),
        }
    }

    /// Translate the request's source and record the result in history
    pub async fn convert(&self, request: &ConversionRequest) -> AppResult<String> {
        let source_code = request.source_code.trim();

        if source_code.is_empty() {
            return Err(self.reject("Please enter source code to convert"));
        }

        if request.source_lang.label() == Some(request.target_lang) {
            return Err(self.reject("Source and target languages are the same"));
        }

        self.set_output(String::new());
        let _busy = BusyGuard::acquire(&self.busy, self.sink.as_ref());

        tracing::info!(
            "[Orchestrator] Converting {} -> {}",
            request.source_lang,
            request.target_lang
        );

        match self.backend.translate(source_code, request.target_lang.name()).await {
            Ok(output) => {
                self.set_output(output.clone());
                lock(&self.history).add(ConversionRecord::new(request, source_code, &output));
                self.notify(AppEvent::success("Code converted successfully!"));
                Ok(output)
            }
            Err(e) => {
                tracing::error!("[Orchestrator] Conversion error: {}", e);
                let message = match &e {
                    AppError::Transport(_) => format!(
                        "Unable to connect to server. Ensure backend is running at {}.",
                        self.backend.base_url()
                    ),
                    other => format!("Conversion failed: {}", other.message()),
                };
                self.notify(AppEvent::error(message));
                Err(e)
            }
        }
    }

    /// Plain-text explanation of `code`; history is left untouched
    pub async fn explain(&self, code: &str, language: Option<LanguageLabel>) -> AppResult<String> {
        if code.is_empty() {
            return Err(self.reject("No code to explain"));
        }

        let _busy = BusyGuard::acquire(&self.busy, self.sink.as_ref());

        match self.backend.explain(code, language.map(|l| l.name())).await {
            Ok(explanation) => {
                let text = strip_markup(explanation.as_deref().unwrap_or(NO_EXPLANATION));
                self.notify(AppEvent::ExplanationReady(text.clone()));
                Ok(text)
            }
            Err(e) => {
                tracing::error!("[Orchestrator] Explain error: {}", e);
                self.notify(AppEvent::error(format!("Explain failed: {}", e.message())));
                Err(e)
            }
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn output(&self) -> String {
        lock(&self.output).clone()
    }

    pub fn set_output(&self, output: String) {
        *lock(&self.output) = output.clone();
        self.notify(AppEvent::OutputChanged(output));
    }

    pub fn history(&self) -> Vec<ConversionRecord> {
        lock(&self.history).all().to_vec()
    }

    pub fn history_item(&self, index: usize) -> Option<ConversionRecord> {
        lock(&self.history).get(index).cloned()
    }

    pub fn clear_history(&self) {
        lock(&self.history).clear();
    }

    fn notify(&self, event: AppEvent) {
        emit_event(self.sink.as_ref(), event);
    }

    fn reject(&self, message: &str) -> AppError {
        self.notify(AppEvent::error(message));
        AppError::Validation(message.to_string())
    }
}
