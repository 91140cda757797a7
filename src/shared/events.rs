use serde::{Deserialize, Serialize};

use super::types::{ConversionRecord, LanguageLabel, NoticeKind};
use crate::core::theme::Theme;

/// Signals emitted towards whatever presents the workspace (page, terminal, tests)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "payload")] // Tagged enum for easier frontend parsing
pub enum AppEvent {
    #[serde(rename = "history://updated")]
    HistoryUpdated(Vec<ConversionRecord>),

    #[serde(rename = "notice://show")]
    Notice { kind: NoticeKind, message: String },

    #[serde(rename = "workspace://busy")]
    BusyChanged(bool),

    #[serde(rename = "workspace://output")]
    OutputChanged(String),

    #[serde(rename = "workspace://source-detected")]
    SourceLanguageDetected(LanguageLabel),

    #[serde(rename = "workspace://explanation")]
    ExplanationReady(String),

    #[serde(rename = "theme://changed")]
    ThemeChanged(Theme),
}

impl AppEvent {
    pub fn success(message: impl Into<String>) -> Self {
        AppEvent::Notice {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        AppEvent::Notice {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_tagged_by_channel() {
        let json = serde_json::to_value(AppEvent::error("No code to download")).unwrap();
        assert_eq!(json["event"], "notice://show");
        assert_eq!(json["payload"]["kind"], "error");
        assert_eq!(json["payload"]["message"], "No code to download");

        let json = serde_json::to_value(AppEvent::ThemeChanged(Theme::Light)).unwrap();
        assert_eq!(json, serde_json::json!({"event": "theme://changed", "payload": "light"}));
    }
}
