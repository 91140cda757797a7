use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::shared::error::AppError;

/// Programming languages the converter knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageLabel {
    Python,
    JavaScript,
    TypeScript,
    Java,
    C,
    #[serde(rename = "C++")]
    Cpp,
    #[serde(rename = "C#")]
    CSharp,
    Go,
    Rust,
    Kotlin,
    Swift,
    #[serde(rename = "Objective-C")]
    ObjectiveC,
    Scala,
    Perl,
    Bash,
    #[serde(rename = "SQL")]
    Sql,
    #[serde(rename = "PHP")]
    Php,
    Ruby,
}

impl LanguageLabel {
    pub const ALL: [LanguageLabel; 18] = [
        LanguageLabel::Python,
        LanguageLabel::JavaScript,
        LanguageLabel::TypeScript,
        LanguageLabel::Java,
        LanguageLabel::C,
        LanguageLabel::Cpp,
        LanguageLabel::CSharp,
        LanguageLabel::Go,
        LanguageLabel::Rust,
        LanguageLabel::Kotlin,
        LanguageLabel::Swift,
        LanguageLabel::ObjectiveC,
        LanguageLabel::Scala,
        LanguageLabel::Perl,
        LanguageLabel::Bash,
        LanguageLabel::Sql,
        LanguageLabel::Php,
        LanguageLabel::Ruby,
    ];

    /// Display name, also the wire representation
    pub fn name(&self) -> &'static str {
        match self {
            LanguageLabel::Python => "Python",
            LanguageLabel::JavaScript => "JavaScript",
            LanguageLabel::TypeScript => "TypeScript",
            LanguageLabel::Java => "Java",
            LanguageLabel::C => "C",
            LanguageLabel::Cpp => "C++",
            LanguageLabel::CSharp => "C#",
            LanguageLabel::Go => "Go",
            LanguageLabel::Rust => "Rust",
            LanguageLabel::Kotlin => "Kotlin",
            LanguageLabel::Swift => "Swift",
            LanguageLabel::ObjectiveC => "Objective-C",
            LanguageLabel::Scala => "Scala",
            LanguageLabel::Perl => "Perl",
            LanguageLabel::Bash => "Bash",
            LanguageLabel::Sql => "SQL",
            LanguageLabel::Php => "PHP",
            LanguageLabel::Ruby => "Ruby",
        }
    }
}

impl fmt::Display for LanguageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LanguageLabel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        LanguageLabel::ALL
            .iter()
            .copied()
            .find(|label| label.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AppError::Validation(format!("Unknown language: {}", wanted)))
    }
}

/// Source-language selector value: a concrete language or the "Auto" sentinel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LanguageSelection {
    #[default]
    Auto,
    Language(LanguageLabel),
}

impl LanguageSelection {
    pub fn name(&self) -> &'static str {
        match self {
            LanguageSelection::Auto => "Auto",
            LanguageSelection::Language(label) => label.name(),
        }
    }

    pub fn label(&self) -> Option<LanguageLabel> {
        match self {
            LanguageSelection::Auto => None,
            LanguageSelection::Language(label) => Some(*label),
        }
    }

    pub fn is_auto(&self) -> bool {
        matches!(self, LanguageSelection::Auto)
    }
}

impl From<LanguageLabel> for LanguageSelection {
    fn from(label: LanguageLabel) -> Self {
        LanguageSelection::Language(label)
    }
}

impl fmt::Display for LanguageSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LanguageSelection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("auto") {
            Ok(LanguageSelection::Auto)
        } else {
            s.parse::<LanguageLabel>().map(LanguageSelection::Language)
        }
    }
}

impl Serialize for LanguageSelection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for LanguageSelection {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(|_| serde::de::Error::custom(format!("invalid language: {}", raw)))
    }
}

/// One conversion as submitted by the user
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionRequest {
    pub source_code: String,
    pub source_lang: LanguageSelection,
    pub target_lang: LanguageLabel,
}

impl ConversionRequest {
    pub fn new(
        source_code: impl Into<String>,
        source_lang: impl Into<LanguageSelection>,
        target_lang: LanguageLabel,
    ) -> Self {
        Self {
            source_code: source_code.into(),
            source_lang: source_lang.into(),
            target_lang,
        }
    }
}

/// A completed conversion kept in history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionRecord {
    #[serde(default)]
    pub source_code: String,
    #[serde(default)]
    pub source_lang: String,
    #[serde(default)]
    pub target_lang: String,
    #[serde(default)]
    pub output: String,
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub timestamp: i64,
}

impl ConversionRecord {
    pub fn new(request: &ConversionRequest, source_code: &str, output: &str) -> Self {
        Self {
            source_code: source_code.to_string(),
            source_lang: request.source_lang.name().to_string(),
            target_lang: request.target_lang.name().to_string(),
            output: output.to_string(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

// -- Wire schemas shared by the backend routes and the backend client --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertPayload {
    pub source_code: String,
    pub target_language: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertResponse {
    pub output: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainPayload {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainResponse {
    pub explanation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub model: String,
}

/// Error body returned by every failing route
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_round_trips_display_names() {
        for label in LanguageLabel::ALL {
            assert_eq!(label.name().parse::<LanguageLabel>().unwrap(), label);
        }
        assert_eq!("c++".parse::<LanguageLabel>().unwrap(), LanguageLabel::Cpp);
        assert_eq!("objective-c".parse::<LanguageLabel>().unwrap(), LanguageLabel::ObjectiveC);
        assert!("Cobol".parse::<LanguageLabel>().is_err());
    }

    #[test]
    fn test_selection_parses_auto_sentinel() {
        assert_eq!("auto".parse::<LanguageSelection>().unwrap(), LanguageSelection::Auto);
        assert_eq!(
            "C#".parse::<LanguageSelection>().unwrap(),
            LanguageSelection::Language(LanguageLabel::CSharp)
        );
        assert_eq!(serde_json::to_string(&LanguageSelection::Auto).unwrap(), "\"Auto\"");
    }

    #[test]
    fn test_record_uses_camel_case_keys() {
        let record = ConversionRecord {
            source_code: "x = 1".to_string(),
            source_lang: "Python".to_string(),
            target_lang: "C++".to_string(),
            output: "int x = 1;".to_string(),
            timestamp: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["sourceCode"], "x = 1");
        assert_eq!(json["targetLang"], "C++");
        assert_eq!(json["timestamp"], 1_700_000_000_000_i64);
    }

    #[test]
    fn test_record_records_selection_names() {
        let request = ConversionRequest::new("print('hi')", LanguageSelection::Auto, LanguageLabel::Go);
        let record = ConversionRecord::new(&request, "print('hi')", "fmt.Println(\"hi\")");
        assert_eq!(record.source_lang, "Auto");
        assert_eq!(record.target_lang, "Go");
        assert!(record.timestamp > 0);
    }
}
