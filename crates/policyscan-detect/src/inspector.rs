//! Page-inspection collaborators: the read-only boundary between the scan
//! pipeline and wherever pages come from.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use policyscan_core::{DetectionStrategy, PageSignal, PipelineError};
use reqwest::{Client, StatusCode, Url};

use crate::error::DetectError;
use crate::html::page_signal;

/// Produces a [`PageSignal`] for a page handle.
///
/// Inspection failures (no such page, permission denied, unreachable host)
/// are reported as [`PipelineError::AccessDenied`].
pub trait PageInspector: Send + Sync {
    fn inspect(&self, page: &str) -> impl Future<Output = Result<PageSignal, PipelineError>> + Send;
}

/// Fetches pages over HTTP and inspects their HTML.
pub struct HttpPageInspector {
    client: Client,
    strategy: DetectionStrategy,
}

impl HttpPageInspector {
    /// # Errors
    ///
    /// Returns [`DetectError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        strategy: DetectionStrategy,
    ) -> Result<Self, DetectError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client, strategy })
    }
}

impl PageInspector for HttpPageInspector {
    async fn inspect(&self, page: &str) -> Result<PageSignal, PipelineError> {
        let url = Url::parse(page.trim())
            .map_err(|e| PipelineError::AccessDenied(format!("invalid page URL '{page}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(PipelineError::AccessDenied(format!(
                "unsupported page scheme '{}'",
                url.scheme()
            )));
        }

        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await
            .map_err(|e| PipelineError::AccessDenied(format!("fetching {url}: {e}")))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(PipelineError::AccessDenied(format!(
                "permission denied for {url} (HTTP {})",
                status.as_u16()
            )));
        }
        if !status.is_success() {
            return Err(PipelineError::AccessDenied(format!(
                "unexpected HTTP {} from {url}",
                status.as_u16()
            )));
        }

        let final_url = response.url().to_string();
        let body = response
            .text()
            .await
            .map_err(|e| PipelineError::AccessDenied(format!("reading {url}: {e}")))?;

        let signal = page_signal(&final_url, &body, self.strategy);
        tracing::debug!(
            url = %final_url,
            candidates = signal.candidate_elements.len(),
            text_chars = signal.page_text.chars().count(),
            "page inspected"
        );
        Ok(signal)
    }
}

/// Serves pre-built signals by handle. Unknown handles have no document.
#[derive(Debug, Clone, Default)]
pub struct StaticPageInspector {
    pages: HashMap<String, PageSignal>,
}

impl StaticPageInspector {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a signal under its own `source_url`.
    #[must_use]
    pub fn with_signal(mut self, signal: PageSignal) -> Self {
        self.pages.insert(signal.source_url.clone(), signal);
        self
    }

    /// Registers raw HTML under `url`, inspected with `strategy`.
    #[must_use]
    pub fn with_html(self, url: &str, html: &str, strategy: DetectionStrategy) -> Self {
        self.with_signal(page_signal(url, html, strategy))
    }
}

impl PageInspector for StaticPageInspector {
    async fn inspect(&self, page: &str) -> Result<PageSignal, PipelineError> {
        self.pages
            .get(page)
            .cloned()
            .ok_or_else(|| PipelineError::AccessDenied(format!("no active document for '{page}'")))
    }
}
