use regex::Regex;
use std::sync::OnceLock;

struct MarkupRules {
    bold: Regex,
    italic: Regex,
    h3: Regex,
    h2: Regex,
    h1: Regex,
    tab_bullet: Regex,
    indent: Regex,
}

fn rules() -> &'static MarkupRules {
    static RULES: OnceLock<MarkupRules> = OnceLock::new();
    RULES.get_or_init(|| MarkupRules {
        bold: Regex::new(r"\*\*([^*]+)\*\*").expect("valid bold regex"),
        italic: Regex::new(r"\*([^*]+)\*").expect("valid italic regex"),
        h3: Regex::new(r"(?m)^###\s+").expect("valid heading regex"),
        h2: Regex::new(r"(?m)^##\s+").expect("valid heading regex"),
        h1: Regex::new(r"(?m)^#\s+").expect("valid heading regex"),
        tab_bullet: Regex::new(r"(?m)^\t\+\s+").expect("valid bullet regex"),
        indent: Regex::new(r"(?m)^\s{2,}").expect("valid indent regex"),
    })
}

/// Reduce model-written markdown to plain text for display
pub fn strip_markup(text: &str) -> String {
    let rules = rules();
    let text = rules.bold.replace_all(text, "$1");
    let text = rules.italic.replace_all(&text, "$1");
    let text = rules.h3.replace_all(&text, "");
    let text = rules.h2.replace_all(&text, "");
    let text = rules.h1.replace_all(&text, "");
    let text = rules.tab_bullet.replace_all(&text, "• ");
    rules.indent.replace_all(&text, "").into_owned()
}
