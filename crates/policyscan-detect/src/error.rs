use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
