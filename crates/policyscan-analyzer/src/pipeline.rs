//! Sequential build → send → decode pipeline for one detection result.

use policyscan_core::{DetectionResult, PipelineError, PromptMode, ScanOutcome};

use crate::client::CompletionBackend;
use crate::decode::decode;
use crate::prompt::PromptBuilder;

/// Turns detection results into outcomes using one completion backend.
pub struct Analyzer<C> {
    backend: C,
    prompts: PromptBuilder,
    mode: PromptMode,
}

impl<C: CompletionBackend> Analyzer<C> {
    pub fn new(backend: C, prompts: PromptBuilder, mode: PromptMode) -> Self {
        Self {
            backend,
            prompts,
            mode,
        }
    }

    #[must_use]
    pub fn mode(&self) -> PromptMode {
        self.mode
    }

    #[must_use]
    pub fn prompts(&self) -> &PromptBuilder {
        &self.prompts
    }

    /// Analyzes a detection result. `NotFound` short-circuits without a
    /// completion call.
    ///
    /// # Errors
    ///
    /// Any [`PipelineError`] from the completion call or the decoder.
    pub async fn run(&self, detection: DetectionResult) -> Result<ScanOutcome, PipelineError> {
        match detection {
            DetectionResult::NotFound => Ok(ScanOutcome::NotFound),
            DetectionResult::Found { url, content } => self.analyze(&url, content.as_deref()).await,
        }
    }

    /// Analyzes the policy at `url`, optionally with its text inlined.
    ///
    /// # Errors
    ///
    /// Any [`PipelineError`] from the completion call or the decoder.
    pub async fn analyze(
        &self,
        url: &str,
        content: Option<&str>,
    ) -> Result<ScanOutcome, PipelineError> {
        let request = self.prompts.build(url, content, self.mode);
        tracing::info!(
            url,
            mode = %self.mode,
            model = %request.model,
            prompt_sha256 = %request.fingerprint(),
            prompt_chars = request.instruction.chars().count(),
            "sending completion request"
        );

        let answer = self.backend.complete(&request).await?;
        tracing::debug!(answer_chars = answer.as_str().chars().count(), "completion answered");

        let outcome = decode(&answer, self.mode).map(|outcome| match outcome {
            ScanOutcome::Report { report } => ScanOutcome::Report {
                report: report.with_url(url),
            },
            other => other,
        });
        match &outcome {
            Ok(ScanOutcome::Report { report }) => {
                tracing::info!(overall = report.overall(), "structured assessment decoded");
            }
            Ok(ScanOutcome::Narrative { .. }) => tracing::info!("narrative assessment received"),
            Ok(ScanOutcome::NotFound) => tracing::info!("model reported no privacy policy"),
            Err(e) => tracing::warn!(error = %e, "completion answer rejected"),
        }
        outcome
    }
}
