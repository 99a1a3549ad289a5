use std::time::Duration;

use policyscan_core::PipelineError;
use thiserror::Error;

/// Failures inside one completion exchange.
///
/// Converted into [`PipelineError::TransportFailure`] at the client boundary;
/// kept separate so retry eligibility can be decided on the details.
#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid completion endpoint '{endpoint}': {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// `retry_after` is the server's `Retry-After` hint, when it sent one in seconds.
    #[error("completion service returned HTTP {status}: {body}")]
    UnexpectedStatus {
        status: u16,
        body: String,
        retry_after: Option<Duration>,
    },

    #[error("completion envelope is not valid JSON: {0}")]
    Deserialize(#[source] serde_json::Error),

    #[error("completion envelope is missing {0}")]
    MissingField(&'static str),
}

impl From<CompletionError> for PipelineError {
    fn from(err: CompletionError) -> Self {
        PipelineError::TransportFailure(err.to_string())
    }
}

/// Misuse of a [`ScanSession`](crate::ScanSession).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("a scan is already in progress")]
    ScanInProgress,
}
