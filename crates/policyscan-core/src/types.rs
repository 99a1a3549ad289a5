use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::score::ScoreReport;

/// How the model is asked to answer, and therefore how the answer is decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptMode {
    /// Free-form markdown, passed through to the presentation layer.
    Narrative,
    /// A strict JSON object of per-category scores and descriptions.
    Structured,
}

impl PromptMode {
    /// Parses a configuration value (`narrative` / `structured`, case-insensitive).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "narrative" => Some(PromptMode::Narrative),
            "structured" => Some(PromptMode::Structured),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            PromptMode::Narrative => "narrative",
            PromptMode::Structured => "structured",
        }
    }
}

impl fmt::Display for PromptMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of page element a candidate's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementTag {
    Link,
    Heading,
    Span,
    Paragraph,
}

/// Visible text of one inspected element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateElement {
    pub text: String,
    pub tag: ElementTag,
}

impl CandidateElement {
    pub fn new(tag: ElementTag, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tag,
        }
    }
}

/// A read-only snapshot of one page, produced fresh for every scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSignal {
    /// URL of the inspected page.
    pub source_url: String,
    /// Candidate elements in document order.
    pub candidate_elements: Vec<CandidateElement>,
    /// Whitespace-collapsed visible text of the whole page.
    pub page_text: String,
}

/// Outcome of scanning a page for privacy-policy indicators.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionResult {
    /// A policy reference was found. `content` is set in whole-page-text mode.
    Found { url: String, content: Option<String> },
    NotFound,
}

impl DetectionResult {
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, DetectionResult::Found { .. })
    }
}

/// Everything needed for one call to the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    pub model: String,
    pub mode: PromptMode,
    pub instruction: String,
}

impl CompletionRequest {
    /// Hex SHA-256 over model, mode and instruction.
    ///
    /// Identical inputs always produce identical requests, so this is safe to
    /// log in place of the prompt itself.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.model.as_bytes());
        hasher.update([0]);
        hasher.update(self.mode.as_str().as_bytes());
        hasher.update([0]);
        hasher.update(self.instruction.as_bytes());
        hasher
            .finalize()
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

/// Raw text returned by the completion service. Opaque until decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionAnswer(pub String);

impl CompletionAnswer {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for CompletionAnswer {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// What a successful scan hands to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScanOutcome {
    /// Markdown produced in narrative mode.
    Narrative { text: String },
    /// Validated, aggregated scores produced in structured mode.
    Report { report: ScoreReport },
    /// No privacy policy was detected, either locally or by the model.
    NotFound,
}
