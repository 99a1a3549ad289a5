use thiserror::Error;

/// Failure of one pipeline run. A run yields either an outcome or exactly one
/// of these, never both.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// The page could not be inspected.
    #[error("page inspection failed: {0}")]
    AccessDenied(String),

    /// Network failure, non-success status, or an unexpected response envelope.
    #[error("completion transport failed: {0}")]
    TransportFailure(String),

    /// The answer was required to be JSON and was not.
    #[error("completion answer is not valid JSON: {0}")]
    MalformedResponse(String),

    /// The answer parsed as JSON but a required field is missing or invalid.
    #[error("completion answer violates schema at {field}: {reason}")]
    SchemaViolation { field: String, reason: String },

    /// The completion exchange did not finish within the configured bound.
    #[error("completion timed out after {secs}s")]
    Timeout { secs: u64 },
}

impl PipelineError {
    /// Shorthand for [`PipelineError::SchemaViolation`].
    pub fn schema(field: impl Into<String>, reason: impl Into<String>) -> Self {
        PipelineError::SchemaViolation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
