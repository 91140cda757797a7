use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::core::storage::LocalStore;
use crate::shared::emit::{emit_event, EventSink};
use crate::shared::error::AppResult;
use crate::shared::events::AppEvent;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Persisted theme identifier
pub struct ThemeStore {
    store: Arc<dyn LocalStore>,
    current: Theme,
}

impl ThemeStore {
    /// Read the stored theme; anything missing or unrecognized means dark
    pub fn load(store: Arc<dyn LocalStore>) -> Self {
        let current = match store.get(THEME_KEY) {
            Ok(Some(raw)) => Theme::parse(&raw).unwrap_or_else(|| {
                tracing::warn!("[Theme] Unrecognized stored theme '{}', using dark", raw);
                Theme::default()
            }),
            Ok(None) => Theme::default(),
            Err(e) => {
                tracing::warn!("[Theme] Failed to read theme: {}", e);
                Theme::default()
            }
        };

        Self { store, current }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn set(&mut self, theme: Theme, sink: &dyn EventSink) -> AppResult<()> {
        self.current = theme;
        emit_event(sink, AppEvent::ThemeChanged(theme));
        self.store.set(THEME_KEY, theme.as_str())
    }

    /// Flip between dark and light; the in-memory value changes even if persisting fails
    pub fn toggle(&mut self, sink: &dyn EventSink) -> Theme {
        let next = self.current.toggled();
        if let Err(e) = self.set(next, sink) {
            tracing::error!("[Theme] Failed to persist theme: {}", e);
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::InMemoryStore;
    use crate::shared::emit::MemorySink;

    #[test]
    fn test_defaults_to_dark() {
        let store: Arc<dyn LocalStore> = Arc::new(InMemoryStore::new());
        assert_eq!(ThemeStore::load(store).current(), Theme::Dark);
    }

    #[test]
    fn test_unrecognized_value_falls_back() {
        let store: Arc<dyn LocalStore> = Arc::new(InMemoryStore::new());
        store.set(THEME_KEY, "solarized").unwrap();
        assert_eq!(ThemeStore::load(store).current(), Theme::Dark);
    }

    #[test]
    fn test_toggle_persists_and_emits() {
        let store: Arc<dyn LocalStore> = Arc::new(InMemoryStore::new());
        let sink = MemorySink::new();
        let mut themes = ThemeStore::load(Arc::clone(&store));

        assert_eq!(themes.toggle(&sink), Theme::Light);
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
        assert_eq!(sink.events(), vec![AppEvent::ThemeChanged(Theme::Light)]);

        let reloaded = ThemeStore::load(store);
        assert_eq!(reloaded.current(), Theme::Light);
    }
}
