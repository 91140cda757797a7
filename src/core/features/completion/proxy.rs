//! Completion proxy
//!
//! Turns translate/explain requests into provider prompts and sanitizes what
//! comes back. Provider failures are reported as-is and never retried.

use regex::Regex;
use std::sync::{Arc, OnceLock};

use super::provider::{ChatCompletionRequest, ChatMessage, CompletionProvider};
use crate::shared::error::{AppError, AppResult};

pub const TEMPERATURE: f32 = 0.2;
pub const TRANSLATE_MAX_TOKENS: u32 = 4000;
pub const EXPLAIN_MAX_TOKENS: u32 = 1000;

pub struct CompletionProxy {
    provider: Arc<dyn CompletionProvider>,
    model: String,
}

impl CompletionProxy {
    pub fn new(provider: Arc<dyn CompletionProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Convert `source_code` into `target_language`, returning bare code
    pub async fn translate(&self, source_code: &str, target_language: &str) -> AppResult<String> {
        if source_code.trim().is_empty() {
            return Err(AppError::Validation("sourceCode cannot be empty".to_string()));
        }

        tracing::info!("[Proxy] Converting code to {}...", target_language);
        let request = self.request(translate_prompt(source_code, target_language), TRANSLATE_MAX_TOKENS);
        let content = self.provider.complete(&request).await?;
        let cleaned = clean_code_output(content.trim());

        tracing::info!("[Proxy] Conversion successful");
        Ok(cleaned)
    }

    /// Plain-English explanation of `code`
    pub async fn explain(&self, code: &str, language: Option<&str>) -> AppResult<String> {
        if code.is_empty() {
            return Err(AppError::Validation("Missing required field: code".to_string()));
        }

        tracing::info!("[Proxy] Explaining {}", language.unwrap_or("code"));
        let request = self.request(explain_prompt(code, language), EXPLAIN_MAX_TOKENS);
        let content = self.provider.complete(&request).await?;
        Ok(content.trim().to_string())
    }

    fn request(&self, prompt: String, max_tokens: u32) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage::user(prompt)],
            temperature: TEMPERATURE,
            max_tokens,
        }
    }
}

pub fn translate_prompt(source_code: &str, target_language: &str) -> String {
    format!(
        "Convert the following code to {target}. \n\n\
         RULES:\n\
         1. Convert ONLY the code - nothing else\n\
         2. If the original code has comments, translate them to English\n\
         3. DO NOT add any new comments that weren't in the original code\n\
         4. DO NOT add explanations\n\
         5. Output ONLY the converted code with NO markdown formatting\n\n\
         Code to convert:\n{code}",
        target = target_language,
        code = source_code
    )
}

pub fn explain_prompt(code: &str, language: Option<&str>) -> String {
    let language = language.filter(|l| !l.is_empty()).unwrap_or("code");
    format!(
        "Explain the following {} in clear, concise plain English. Describe the purpose, \
         major steps, and any important implementation details. Do NOT return code; \
         return explanation only:\n\n{}",
        language, code
    )
}

fn fence_opener() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^```[\w+#.-]*[ \t]*\r?\n").expect("valid fence regex"))
}

fn strip_fences_once(code: &str) -> String {
    let opened = fence_opener().replacen(code, 1, "");
    let trimmed = opened.trim_end();
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim().to_string()
}

/// Remove a leading fenced-code opener (with optional language tag) and a
/// trailing fence, then trim. Repeats until nothing changes, so applying it
/// twice gives the same result as applying it once.
pub fn clean_code_output(code: &str) -> String {
    let mut current = code.trim().to_string();
    loop {
        let next = strip_fences_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
