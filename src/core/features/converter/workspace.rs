use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::orchestrator::ConversionOrchestrator;
use crate::core::context::{classify, classify_by_extension, file_extension_for, Debouncer};
use crate::core::theme::{Theme, ThemeStore};
use crate::shared::emit::{emit_event, EventSink};
use crate::shared::error::{AppError, AppResult};
use crate::shared::events::AppEvent;
use crate::shared::types::{ConversionRecord, ConversionRequest, LanguageLabel, LanguageSelection};

/// Editor fields a page would bind to its inputs
#[derive(Debug, Clone, PartialEq)]
pub struct EditorState {
    pub source_text: String,
    pub source_lang: LanguageSelection,
    pub target_lang: LanguageLabel,
    /// Set once the user picks a concrete source language; disables auto-detect
    pub user_chose_source: bool,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            source_text: String::new(),
            source_lang: LanguageSelection::Auto,
            target_lang: LanguageLabel::JavaScript,
            user_chose_source: false,
        }
    }
}

fn lock(state: &Mutex<EditorState>) -> MutexGuard<'_, EditorState> {
    match state.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("[Workspace] State mutex poisoned, recovering...");
            poisoned.into_inner()
        }
    }
}

fn detected(sink: &dyn EventSink, label: LanguageLabel) {
    emit_event(sink, AppEvent::SourceLanguageDetected(label));
    emit_event(sink, AppEvent::success(format!("Detected language: {}", label)));
}

/// UI-agnostic controller: one method per user command
pub struct Workspace {
    state: Arc<Mutex<EditorState>>,
    orchestrator: Arc<ConversionOrchestrator>,
    themes: Mutex<ThemeStore>,
    debouncer: Debouncer,
    sink: Arc<dyn EventSink>,
}

impl Workspace {
    pub fn new(
        orchestrator: Arc<ConversionOrchestrator>,
        themes: ThemeStore,
        sink: Arc<dyn EventSink>,
        debounce: Duration,
    ) -> Self {
        Self {
            state: Arc::new(Mutex::new(EditorState::default())),
            orchestrator,
            themes: Mutex::new(themes),
            debouncer: Debouncer::new(debounce),
            sink,
        }
    }

    pub fn state(&self) -> EditorState {
        lock(&self.state).clone()
    }

    pub fn output(&self) -> String {
        self.orchestrator.output()
    }

    pub fn history(&self) -> Vec<ConversionRecord> {
        self.orchestrator.history()
    }

    pub fn orchestrator(&self) -> &Arc<ConversionOrchestrator> {
        &self.orchestrator
    }

    /// Store typed text and re-arm language detection.
    ///
    /// Detection runs on whatever text is current once typing pauses, and
    /// only while the source selection is still `Auto` by default.
    pub fn input(&self, text: impl Into<String>) {
        lock(&self.state).source_text = text.into();

        let state = Arc::clone(&self.state);
        let sink = Arc::clone(&self.sink);
        self.debouncer.schedule(move || {
            let mut state = lock(&state);
            if !state.source_lang.is_auto() || state.user_chose_source {
                return;
            }
            match classify(&state.source_text) {
                Some(label) => {
                    state.source_lang = label.into();
                    drop(state);
                    detected(sink.as_ref(), label);
                }
                None => tracing::debug!("[Workspace] Auto-detect found no match"),
            }
        });
    }

    pub fn select_source(&self, selection: LanguageSelection) {
        let mut state = lock(&self.state);
        state.source_lang = selection;
        state.user_chose_source = !selection.is_auto();
    }

    pub fn select_target(&self, label: LanguageLabel) {
        lock(&self.state).target_lang = label;
    }

    pub async fn convert(&self) -> AppResult<String> {
        let request = {
            let state = lock(&self.state);
            ConversionRequest::new(state.source_text.clone(), state.source_lang, state.target_lang)
        };
        self.orchestrator.convert(&request).await
    }

    /// Exchange source and target languages, and the texts when there is output.
    ///
    /// An `Auto` source is resolved with the classifier first, since the
    /// target must be a concrete language.
    pub fn swap(&self) -> AppResult<()> {
        let mut state = lock(&self.state);

        let resolved = state.source_lang.label().or_else(|| classify(&state.source_text));
        let source = match resolved {
            Some(label) => label,
            None => {
                drop(state);
                return Err(self.fail("Select a source language before swapping"));
            }
        };

        state.source_lang = state.target_lang.into();
        state.target_lang = source;

        let output = self.orchestrator.output();
        if !output.is_empty() {
            let previous_source = std::mem::replace(&mut state.source_text, output);
            drop(state);
            self.orchestrator.set_output(previous_source);
        } else {
            drop(state);
        }

        self.notify(AppEvent::success("Languages swapped!"));
        Ok(())
    }

    /// Load file contents as the source text, detecting the language from the name
    pub fn upload(&self, file_name: &str, contents: impl Into<String>) {
        let label = classify_by_extension(file_name);
        {
            let mut state = lock(&self.state);
            state.source_text = contents.into();
            if let Some(label) = label {
                state.source_lang = label.into();
            }
        }

        if let Some(label) = label {
            detected(self.sink.as_ref(), label);
        }
        self.notify(AppEvent::success("File uploaded successfully!"));
    }

    /// Trim every line of the source text
    pub fn format(&self) -> AppResult<String> {
        let mut state = lock(&self.state);
        let code = state.source_text.trim();
        if code.is_empty() {
            drop(state);
            return Err(self.fail("No code to format"));
        }

        let formatted = code.lines().map(str::trim).collect::<Vec<_>>().join("\n");
        state.source_text = formatted.clone();
        drop(state);

        self.notify(AppEvent::success("Code formatted!"));
        Ok(formatted)
    }

    /// File name and contents for saving the current output
    pub fn download(&self) -> AppResult<(String, String)> {
        let output = self.orchestrator.output();
        if output.is_empty() {
            return Err(self.fail("No code to download"));
        }

        let target = lock(&self.state).target_lang;
        let file_name = format!("converted_code.{}", file_extension_for(target.into()));
        self.notify(AppEvent::success("Code downloaded!"));
        Ok((file_name, output))
    }

    /// Explain the current output in the target language
    pub async fn explain(&self) -> AppResult<String> {
        let target = lock(&self.state).target_lang;
        let output = self.orchestrator.output();
        self.orchestrator.explain(&output, Some(target)).await
    }

    pub fn clear_history(&self) {
        self.orchestrator.clear_history();
        self.notify(AppEvent::success("History cleared"));
    }

    /// Restore all four fields of a past conversion; out-of-range indexes do nothing
    pub fn load_history_item(&self, index: usize) -> Option<ConversionRecord> {
        let record = self.orchestrator.history_item(index)?;
        {
            let mut state = lock(&self.state);
            state.source_text = record.source_code.clone();
            if let Ok(selection) = record.source_lang.parse::<LanguageSelection>() {
                state.source_lang = selection;
            }
            if let Ok(label) = record.target_lang.parse::<LanguageLabel>() {
                state.target_lang = label;
            }
        }
        self.orchestrator.set_output(record.output.clone());
        self.notify(AppEvent::success("Loaded history item"));
        Some(record)
    }

    pub fn theme(&self) -> Theme {
        match self.themes.lock() {
            Ok(themes) => themes.current(),
            Err(poisoned) => poisoned.into_inner().current(),
        }
    }

    pub fn toggle_theme(&self) -> Theme {
        let theme = match self.themes.lock() {
            Ok(mut themes) => themes.toggle(self.sink.as_ref()),
            Err(poisoned) => poisoned.into_inner().toggle(self.sink.as_ref()),
        };
        self.notify(AppEvent::success(format!("Switched to {} theme", theme)));
        theme
    }

    fn notify(&self, event: AppEvent) {
        emit_event(self.sink.as_ref(), event);
    }

    fn fail(&self, message: &str) -> AppError {
        self.notify(AppEvent::error(message));
        AppError::Validation(message.to_string())
    }
}
