//! Prompting, completion and decoding for privacy-policy assessments.
//!
//! The pipeline is strictly sequential: a detection result becomes a
//! deterministic [`CompletionRequest`](policyscan_core::CompletionRequest)
//! ([`PromptBuilder`]), is sent once to the completion service
//! ([`CompletionClient`]), and the raw answer is validated into a
//! [`ScanOutcome`](policyscan_core::ScanOutcome) ([`decode`]). The
//! [`ScanSession`] owns the one-scan-at-a-time rule and makes `reset`
//! invalidate whatever is still in flight.

pub mod client;
pub mod decode;
pub mod error;
pub mod pipeline;
pub mod prompt;
pub mod session;

mod retry;

pub use client::{CompletionBackend, CompletionClient, CompletionClientConfig};
pub use decode::{decode, NO_POLICY_SENTINEL};
pub use error::{CompletionError, SessionError};
pub use pipeline::Analyzer;
pub use prompt::PromptBuilder;
pub use session::{ScanDelivery, ScanSession, ViewState};
