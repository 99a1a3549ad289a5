//! Shared vocabulary for the privacy-policy scan pipeline.
//!
//! Everything the detection, prompting, decoding and presentation layers have
//! to agree on lives here: the closed [`CategoryKey`] set, the value objects
//! passed between pipeline stages, the [`PipelineError`] taxonomy, and the
//! environment-driven [`AppConfig`].

pub mod app_config;
pub mod category;
pub mod config;
pub mod error;
pub mod score;
pub mod types;

pub use app_config::{AppConfig, DetectionStrategy, PromptSettings};
pub use category::CategoryKey;
pub use config::{load_app_config, load_app_config_from_env, load_prompt_settings_from_env};
pub use error::{ConfigError, PipelineError};
pub use score::{aggregate, ReportRow, ScoreDraft, ScoreReport};
pub use types::{
    CandidateElement, CompletionAnswer, CompletionRequest, DetectionResult, ElementTag,
    PageSignal, PromptMode, ScanOutcome,
};
