//! Instruction text sent to the completion service.
//!
//! Every category name and definition comes from [`CategoryKey`], so the
//! prompt and the decoder can never disagree about which categories exist.

use std::fmt::Write as _;

use policyscan_core::{CategoryKey, CompletionRequest, PromptMode};

use crate::decode::NO_POLICY_SENTINEL;

/// Builds [`CompletionRequest`]s for one model.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    model: String,
}

impl PromptBuilder {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
        }
    }

    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Request for analyzing the policy at `url`, optionally with its text.
    ///
    /// Pure: identical arguments always yield an identical request.
    #[must_use]
    pub fn build(&self, url: &str, content: Option<&str>, mode: PromptMode) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            mode,
            instruction: instruction(url, content, mode),
        }
    }
}

/// The instruction text for `mode`.
#[must_use]
pub fn instruction(url: &str, content: Option<&str>, mode: PromptMode) -> String {
    let mut out = match mode {
        PromptMode::Narrative => narrative_instruction(url),
        PromptMode::Structured => structured_instruction(url),
    };
    if let Some(text) = content {
        let _ = write!(
            out,
            "\n\nThe page text follows between triple quotes.\n\"\"\"\n{text}\n\"\"\""
        );
    }
    out
}

fn narrative_instruction(url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Detect whether this page is a privacy policy page: {url}.");
    let _ = writeln!(
        out,
        "If there is no privacy policy on the page, reply with exactly \"{NO_POLICY_SENTINEL}\" \
         and do not summarize anything else."
    );
    let _ = writeln!(
        out,
        "If it is a privacy policy page, analyze the privacy policy and give a score from 1 to 10 \
         to each category the policy mentions. Use markdown formatting. Name the URL being \
         analyzed at the top, then show each category and its score clearly, with a paragraph \
         underneath each category explaining the score."
    );
    let _ = write!(out, "Categories to consider:");
    for key in CategoryKey::ALL {
        let _ = write!(out, "\n- {}: {}", key.label(), key.definition());
    }
    out
}

fn structured_instruction(url: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Analyze the privacy policy at {url}.");
    let _ = writeln!(
        out,
        "Return only a JSON object, with no prose, markdown or code fences around it, of exactly \
         this shape:"
    );
    let _ = writeln!(out, "{}", shape_example());
    let _ = writeln!(
        out,
        "Every score is an integer from 1 (worst for the user) to 10 (best for the user). \
         Every category must appear under both \"scores\" and \"description\"; each description \
         is a short explanation of its score."
    );
    let _ = write!(out, "The categories are:");
    for key in CategoryKey::ALL {
        let _ = write!(out, "\n- {}: {}", key.as_str(), key.definition());
    }
    out
}

fn shape_example() -> String {
    let scores: Vec<String> = CategoryKey::ALL
        .iter()
        .map(|key| format!("\"{key}\": <integer 1-10>"))
        .collect();
    let descriptions: Vec<String> = CategoryKey::ALL
        .iter()
        .map(|key| format!("\"{key}\": \"<explanation>\""))
        .collect();
    format!(
        "{{\"scores\": {{{}}}, \"description\": {{{}}}}}",
        scores.join(", "),
        descriptions.join(", ")
    )
}
