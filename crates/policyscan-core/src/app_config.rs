use std::fmt;

use crate::types::PromptMode;

/// Which page elements are inspected for privacy-policy indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DetectionStrategy {
    /// Anchors, level-1/level-2 headings and inline spans.
    #[default]
    Elements,
    /// [`DetectionStrategy::Elements`] plus paragraphs and containers whose
    /// `class` or `id` mentions "policy".
    Attributes,
}

impl DetectionStrategy {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "elements" => Some(DetectionStrategy::Elements),
            "attributes" => Some(DetectionStrategy::Attributes),
            _ => None,
        }
    }
}

impl fmt::Display for DetectionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DetectionStrategy::Elements => write!(f, "elements"),
            DetectionStrategy::Attributes => write!(f, "attributes"),
        }
    }
}

/// The part of [`AppConfig`] that shapes a prompt. Needs no credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptSettings {
    pub model: String,
    pub mode: PromptMode,
}

#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub completion_url: String,
    pub model: String,
    pub mode: PromptMode,
    pub detection: DetectionStrategy,
    pub page_text_mode: bool,
    pub max_content_chars: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub user_agent: String,
    pub log_level: String,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"[redacted]")
            .field("completion_url", &self.completion_url)
            .field("model", &self.model)
            .field("mode", &self.mode)
            .field("detection", &self.detection)
            .field("page_text_mode", &self.page_text_mode)
            .field("max_content_chars", &self.max_content_chars)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("user_agent", &self.user_agent)
            .field("log_level", &self.log_level)
            .finish()
    }
}
