//! Decides whether an inspected page carries privacy-policy content.

use policyscan_core::{DetectionResult, PageSignal};

use crate::keywords::matching_keyword;

/// Keyword-containment detector over a [`PageSignal`].
///
/// In URL mode a match yields `Found { content: None }` and the model is
/// pointed at the page URL. In whole-page-text mode the page's visible text,
/// truncated to `max_content_chars` characters, travels with the result.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    page_text_mode: bool,
    max_content_chars: usize,
}

impl ContentExtractor {
    /// Detector that reports only the page URL.
    #[must_use]
    pub fn url_mode() -> Self {
        Self {
            page_text_mode: false,
            max_content_chars: 0,
        }
    }

    /// Detector that also returns up to `max_content_chars` characters of page text.
    #[must_use]
    pub fn page_text_mode(max_content_chars: usize) -> Self {
        Self {
            page_text_mode: true,
            max_content_chars,
        }
    }

    #[must_use]
    pub fn detect(&self, page: &PageSignal) -> DetectionResult {
        let hit = page.candidate_elements.iter().find_map(|element| {
            matching_keyword(&element.text).map(|keyword| (element, keyword))
        });

        let Some((element, keyword)) = hit else {
            tracing::debug!(
                url = %page.source_url,
                candidates = page.candidate_elements.len(),
                "no privacy-policy indicator found"
            );
            return DetectionResult::NotFound;
        };

        tracing::debug!(
            url = %page.source_url,
            keyword,
            tag = ?element.tag,
            "privacy-policy indicator found"
        );

        let content = if self.page_text_mode {
            Some(truncate_chars(&page.page_text, self.max_content_chars))
                .filter(|text| !text.is_empty())
        } else {
            None
        };

        DetectionResult::Found {
            url: page.source_url.clone(),
            content,
        }
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
