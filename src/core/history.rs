use serde::Serialize;
use std::sync::Arc;
use unicode_segmentation::UnicodeSegmentation;

use crate::core::storage::LocalStore;
use crate::shared::emit::{emit_event, EventSink};
use crate::shared::events::AppEvent;
use crate::shared::types::ConversionRecord;

/// Maximum number of conversions kept
pub const MAX_HISTORY_SIZE: usize = 10;

/// Storage key of the serialized history
pub const HISTORY_KEY: &str = "polycode_history";

const PREVIEW_GRAPHEMES: usize = 80;

/// Newest-first, bounded record of past conversions with write-through persistence
pub struct HistoryCache {
    records: Vec<ConversionRecord>,
    store: Arc<dyn LocalStore>,
    sink: Arc<dyn EventSink>,
}

impl HistoryCache {
    /// Populate from storage. Absent or corrupt data gives an empty cache.
    pub fn load(store: Arc<dyn LocalStore>, sink: Arc<dyn EventSink>) -> Self {
        let records = match store.get(HISTORY_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ConversionRecord>>(&raw) {
                Ok(mut records) => {
                    records.truncate(MAX_HISTORY_SIZE);
                    records
                }
                Err(e) => {
                    tracing::warn!("[History] Failed to parse stored history, starting empty: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!("[History] Failed to read stored history, starting empty: {}", e);
                Vec::new()
            }
        };

        tracing::debug!("[History] Loaded {} records", records.len());
        let cache = Self { records, store, sink };
        cache.render();
        cache
    }

    /// Insert at the front, evicting the oldest record beyond capacity
    pub fn add(&mut self, record: ConversionRecord) {
        self.records.insert(0, record);
        self.records.truncate(MAX_HISTORY_SIZE);
        self.persist();
        self.render();
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.persist();
        self.render();
    }

    pub fn get(&self, index: usize) -> Option<&ConversionRecord> {
        self.records.get(index)
    }

    pub fn all(&self) -> &[ConversionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    // Failures leave the in-memory records authoritative
    fn persist(&self) {
        let serialized = match serde_json::to_string(&self.records) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("[History] Failed to serialize history: {}", e);
                return;
            }
        };

        if let Err(e) = self.store.set(HISTORY_KEY, &serialized) {
            tracing::error!("[History] Failed to persist history: {}", e);
        }
    }

    fn render(&self) {
        emit_event(self.sink.as_ref(), AppEvent::HistoryUpdated(self.records.clone()));
    }
}

/// What a history list row shows for one record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistorySummary {
    pub languages: String,
    pub time_ago: String,
    pub preview: String,
}

pub fn summarize(record: &ConversionRecord, now_ms: i64) -> HistorySummary {
    let preview: String = record
        .source_code
        .graphemes(true)
        .take(PREVIEW_GRAPHEMES)
        .collect();

    HistorySummary {
        languages: format!("{} → {}", record.source_lang, record.target_lang),
        time_ago: time_ago(record.timestamp, now_ms),
        preview: preview.replace('\n', " "),
    }
}

/// Coarse relative age: "just now", then seconds, minutes, hours, days
pub fn time_ago(timestamp_ms: i64, now_ms: i64) -> String {
    if timestamp_ms == 0 {
        return String::new();
    }

    let seconds = now_ms.saturating_sub(timestamp_ms) / 1000;
    if seconds < 10 {
        "just now".to_string()
    } else if seconds < 60 {
        format!("{}s", seconds)
    } else if seconds < 3600 {
        format!("{}m", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h", seconds / 3600)
    } else {
        format!("{}d", seconds / 86_400)
    }
}
