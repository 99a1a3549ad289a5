//! Command handlers for `scan`, `analyze` and `prompt`.

use std::path::Path;

use anyhow::Context;
use policyscan_analyzer::{
    Analyzer, CompletionClient, CompletionClientConfig, PromptBuilder, ScanDelivery, ScanSession,
};
use policyscan_core::{
    load_prompt_settings_from_env, AppConfig, DetectionStrategy, PromptMode, PromptSettings,
};
use policyscan_detect::{ContentExtractor, HttpPageInspector};

use crate::render;

/// Per-invocation settings that take precedence over the environment.
#[derive(Debug, Default)]
pub(crate) struct Overrides {
    pub(crate) mode: Option<PromptMode>,
    pub(crate) model: Option<String>,
    pub(crate) detection: Option<DetectionStrategy>,
    pub(crate) page_text: bool,
}

impl Overrides {
    pub(crate) fn load_config(&self) -> anyhow::Result<AppConfig> {
        let mut config = policyscan_core::load_app_config()
            .context("failed to load configuration from the environment")?;
        self.apply(&mut config);
        Ok(config)
    }

    pub(crate) fn apply(&self, config: &mut AppConfig) {
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if let Some(model) = &self.model {
            config.model.clone_from(model);
        }
        if let Some(detection) = self.detection {
            config.detection = detection;
        }
        if self.page_text {
            config.page_text_mode = true;
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Target {
    /// A page to inspect for policy indicators.
    Page(String),
    /// A policy URL submitted directly.
    Link(String),
}

impl Target {
    fn url(&self) -> &str {
        match self {
            Target::Page(url) | Target::Link(url) => url,
        }
    }
}

/// Runs one scan and prints its outcome. Ctrl-C resets the session, which
/// discards the in-flight result.
///
/// # Errors
///
/// Returns an error if a client cannot be built, the scan fails, or it is
/// cancelled.
pub(crate) async fn run_scan(
    config: &AppConfig,
    target: &Target,
    json: bool,
) -> anyhow::Result<()> {
    tracing::debug!(?config, "configuration loaded");

    let inspector =
        HttpPageInspector::new(config.timeout_secs, &config.user_agent, config.detection)?;
    let extractor = if config.page_text_mode {
        ContentExtractor::page_text_mode(config.max_content_chars)
    } else {
        ContentExtractor::url_mode()
    };
    let client = CompletionClient::new(CompletionClientConfig::from_app_config(config))?;
    let analyzer = Analyzer::new(client, PromptBuilder::new(config.model.clone()), config.mode);
    let session = ScanSession::new(inspector, extractor, analyzer);

    let scan = async {
        match target {
            Target::Page(page) => session.start_scan(page).await,
            Target::Link(url) => session.analyze_link(url).await,
        }
    };
    tokio::pin!(scan);

    let delivery = tokio::select! {
        delivery = &mut scan => delivery?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received, cancelling scan");
            session.reset();
            scan.await?
        }
    };

    match delivery {
        ScanDelivery::Completed(Ok(outcome)) => {
            let rendered = if json {
                render::outcome_json(&outcome, target.url())?
            } else {
                render::outcome_text(&outcome, target.url())
            };
            println!("{rendered}");
            Ok(())
        }
        ScanDelivery::Completed(Err(err)) => {
            Err(anyhow::Error::new(err).context(render::FAILURE_MESSAGE))
        }
        ScanDelivery::Superseded => anyhow::bail!("scan cancelled"),
    }
}

/// Prints the instruction for `url` without sending it. Flags win over
/// `POLICYSCAN_MODE` and `POLICYSCAN_MODEL`; no credential is needed.
///
/// # Errors
///
/// Returns an error if `content_file` cannot be read or `POLICYSCAN_MODE`
/// is not a known mode.
pub(crate) fn run_prompt(
    overrides: &Overrides,
    url: &str,
    content_file: Option<&Path>,
) -> anyhow::Result<()> {
    let content = content_file
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))
        })
        .transpose()?;

    let settings =
        load_prompt_settings_from_env().context("failed to read prompt settings")?;
    let request = prompt_request(overrides, settings, url, content.as_deref());
    tracing::info!(
        mode = %request.mode,
        model = %request.model,
        prompt_sha256 = %request.fingerprint(),
        "instruction built"
    );
    println!("{}", request.instruction);
    Ok(())
}

fn prompt_request(
    overrides: &Overrides,
    settings: PromptSettings,
    url: &str,
    content: Option<&str>,
) -> policyscan_core::CompletionRequest {
    let model = overrides.model.clone().unwrap_or(settings.model);
    let mode = overrides.mode.unwrap_or(settings.mode);
    PromptBuilder::new(model).build(url.trim(), content, mode)
}
