mod render;
mod scan;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use policyscan_core::{DetectionStrategy, PromptMode};
use tracing_subscriber::EnvFilter;

use crate::scan::{Overrides, Target};

#[derive(Debug, Parser)]
#[command(name = "policyscan")]
#[command(about = "Find a site's privacy policy and have a language model assess it")]
struct Cli {
    /// Answer format requested from the model (overrides `POLICYSCAN_MODE`)
    #[arg(long, global = true, value_enum)]
    mode: Option<ModeArg>,

    /// Model identifier (overrides `POLICYSCAN_MODEL`)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Page elements inspected for policy indicators (overrides `POLICYSCAN_DETECTION`)
    #[arg(long, global = true, value_enum)]
    detection: Option<DetectionArg>,

    /// Send the page's visible text along with its URL
    #[arg(long, global = true)]
    page_text: bool,

    /// Print the outcome as JSON instead of markdown
    #[arg(long, global = true, env = "POLICYSCAN_JSON")]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch a page, look for privacy-policy indicators and assess the policy
    Scan {
        /// Page to inspect
        page: String,
    },
    /// Assess the policy at a URL directly, skipping detection
    Analyze {
        /// Privacy policy URL
        url: String,
    },
    /// Print the instruction that would be sent, without calling the service
    Prompt {
        /// Privacy policy URL
        url: String,

        /// Policy text to embed in the instruction
        #[arg(long)]
        content_file: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ModeArg {
    Narrative,
    Structured,
}

impl From<ModeArg> for PromptMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Narrative => PromptMode::Narrative,
            ModeArg::Structured => PromptMode::Structured,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum DetectionArg {
    Elements,
    Attributes,
}

impl From<DetectionArg> for DetectionStrategy {
    fn from(arg: DetectionArg) -> Self {
        match arg {
            DetectionArg::Elements => DetectionStrategy::Elements,
            DetectionArg::Attributes => DetectionStrategy::Attributes,
        }
    }
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            mode: self.mode.map(Into::into),
            model: self.model.clone(),
            detection: self.detection.map(Into::into),
            page_text: self.page_text,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let overrides = cli.overrides();

    match cli.command {
        Commands::Prompt { url, content_file } => {
            let level =
                std::env::var("POLICYSCAN_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            init_tracing(&level)?;
            scan::run_prompt(&overrides, &url, content_file.as_deref())
        }
        Commands::Scan { page } => {
            let config = overrides.load_config()?;
            init_tracing(&config.log_level)?;
            scan::run_scan(&config, &Target::Page(page), cli.json).await
        }
        Commands::Analyze { url } => {
            let config = overrides.load_config()?;
            init_tracing(&config.log_level)?;
            scan::run_scan(&config, &Target::Link(url), cli.json).await
        }
    }
}

/// Logs go to stderr so stdout carries only the rendered outcome.
fn init_tracing(default_level: &str) -> anyhow::Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
