use regex::Regex;
use std::sync::OnceLock;

use crate::shared::types::{LanguageLabel, LanguageSelection};

/// One entry of the ordered detection table
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub matcher: Regex,
    pub label: LanguageLabel,
}

impl PatternRule {
    /// Panics if `pattern` is not a valid regex; rule tables are written by hand
    pub fn new(pattern: &str, label: LanguageLabel) -> Self {
        Self {
            matcher: Regex::new(pattern).expect("valid detection regex"),
            label,
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        self.matcher.is_match(text)
    }
}

/// Heuristic signatures, most specific first. First match wins, so the
/// order here decides ties (e.g. `def` must be seen before a bare `console.`).
const RULE_PATTERNS: &[(&str, LanguageLabel)] = &[
    (r"(?m)\bdef\s+\w+\(|\bimport\s+\w+", LanguageLabel::Python),
    (
        r"(?m)console\.log\(|\bfunction\s+\w+\(|=>|\bconst\s+\w+",
        LanguageLabel::JavaScript,
    ),
    (
        r"(?m)\bclass\s+\w+\b.*\bextends\b|System\.out\.println|public\s+static\s+void\s+main",
        LanguageLabel::Java,
    ),
    (r"(?m)#include\s+<|std::|cout\s*<<", LanguageLabel::Cpp),
    (r"(?m)using\s+System;|Console\.WriteLine\(", LanguageLabel::CSharp),
    (r"package\s+\w+;|fun\s+\w+\(|val\s+\w+|var\s+\w+", LanguageLabel::Kotlin),
    (r"(?m)\bfunc\s+\w+\(|fmt\.Println\(", LanguageLabel::Go),
    (r"(?m)->|let\s+\w+:|fn\s+\w+\(", LanguageLabel::Rust),
    (r"(?m)console\.|import\s+\w+\s+from\s+", LanguageLabel::TypeScript),
    (r"(?m)<\?php|echo\s+", LanguageLabel::Php),
    (r"#!", LanguageLabel::Bash),
];

const EXTENSIONS: &[(&str, LanguageLabel)] = &[
    (".py", LanguageLabel::Python),
    (".js", LanguageLabel::JavaScript),
    (".ts", LanguageLabel::TypeScript),
    (".java", LanguageLabel::Java),
    (".cpp", LanguageLabel::Cpp),
    (".c", LanguageLabel::C),
    (".go", LanguageLabel::Go),
    (".rb", LanguageLabel::Ruby),
    (".php", LanguageLabel::Php),
    (".cs", LanguageLabel::CSharp),
    (".rs", LanguageLabel::Rust),
    (".kt", LanguageLabel::Kotlin),
    (".swift", LanguageLabel::Swift),
    (".m", LanguageLabel::ObjectiveC),
    (".scala", LanguageLabel::Scala),
    (".pl", LanguageLabel::Perl),
    (".sh", LanguageLabel::Bash),
    (".sql", LanguageLabel::Sql),
];

/// The built-in rule table, compiled once
pub fn default_rules() -> &'static [PatternRule] {
    static RULES: OnceLock<Vec<PatternRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        RULE_PATTERNS
            .iter()
            .map(|(pattern, label)| PatternRule::new(pattern, *label))
            .collect()
    })
}

fn sql_fallback(text: &str) -> bool {
    static SELECT_RE: OnceLock<Regex> = OnceLock::new();
    static INSERT_RE: OnceLock<Regex> = OnceLock::new();
    let select = SELECT_RE.get_or_init(|| Regex::new(r"(?i)SELECT\s+.+FROM").expect("valid sql regex"));
    let insert = INSERT_RE.get_or_init(|| Regex::new(r"(?i)INSERT\s+INTO").expect("valid sql regex"));
    select.is_match(text) || insert.is_match(text)
}

/// Guess the language of a code snippet with the built-in rule table
pub fn classify(text: &str) -> Option<LanguageLabel> {
    classify_with(default_rules(), text)
}

/// Guess the language of a code snippet with an arbitrary rule table
///
/// Returns the label of the first rule matching anywhere in the trimmed text,
/// falling back to a case-insensitive `SELECT … FROM` / `INSERT INTO` check.
pub fn classify_with(rules: &[PatternRule], text: &str) -> Option<LanguageLabel> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(rule) = rules.iter().find(|rule| rule.matches(text)) {
        return Some(rule.label);
    }

    if sql_fallback(text) {
        return Some(LanguageLabel::Sql);
    }

    tracing::debug!("classify: no match");
    None
}

/// Guess the language of a file from its name (case-insensitive suffix match)
pub fn classify_by_extension(filename: &str) -> Option<LanguageLabel> {
    let lowered = filename.to_lowercase();
    let found = EXTENSIONS
        .iter()
        .find(|(ext, _)| lowered.ends_with(ext))
        .map(|(_, label)| *label);

    match found {
        Some(label) => tracing::debug!("Matched {} -> {}", filename, label),
        None => tracing::debug!("No language match found for: {}", filename),
    }
    found
}

/// File extension used when saving code of the given language
pub fn file_extension_for(selection: LanguageSelection) -> &'static str {
    match selection.label() {
        Some(label) => EXTENSIONS
            .iter()
            .find(|(_, l)| *l == label)
            .map(|&(ext, _)| &ext[1..])
            .unwrap_or("txt"),
        None => "txt",
    }
}
