use crate::app_config::{AppConfig, DetectionStrategy, PromptSettings};
use crate::types::PromptMode;
use crate::ConfigError;

pub const DEFAULT_COMPLETION_URL: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama3-8b-8192";
pub const DEFAULT_USER_AGENT: &str = "policyscan/0.1 (privacy-policy-analyzer)";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Load only the model and prompt mode, without requiring `POLICYSCAN_API_KEY`.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if `POLICYSCAN_MODE` is not a known mode.
pub fn load_prompt_settings_from_env() -> Result<PromptSettings, ConfigError> {
    build_prompt_settings(|key| std::env::var(key))
}

fn build_prompt_settings<F>(lookup: F) -> Result<PromptSettings, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let model = lookup("POLICYSCAN_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
    let mode = lookup("POLICYSCAN_MODE").unwrap_or_else(|_| "narrative".to_string());
    let mode = parse_mode(&mode)?;
    Ok(PromptSettings { model, mode })
}

/// Core parsing/validation, decoupled from the process environment so tests
/// can drive it from a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let api_key = lookup("POLICYSCAN_API_KEY")
        .ok()
        .filter(|key| !key.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingEnvVar("POLICYSCAN_API_KEY".to_string()))?;

    let completion_url = or_default("POLICYSCAN_COMPLETION_URL", DEFAULT_COMPLETION_URL);
    let PromptSettings { model, mode } = build_prompt_settings(&lookup)?;
    let detection = parse_detection(&or_default("POLICYSCAN_DETECTION", "elements"))?;
    let page_text_mode =
        parse_bool("POLICYSCAN_PAGE_TEXT", &or_default("POLICYSCAN_PAGE_TEXT", "false"))?;
    let max_content_chars = parse_usize("POLICYSCAN_MAX_CONTENT_CHARS", "12000")?;
    let timeout_secs = parse_u64("POLICYSCAN_TIMEOUT_SECS", "30")?;
    let max_retries = parse_u32("POLICYSCAN_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("POLICYSCAN_RETRY_BACKOFF_BASE_MS", "500")?;
    let user_agent = or_default("POLICYSCAN_USER_AGENT", DEFAULT_USER_AGENT);
    let log_level = or_default("POLICYSCAN_LOG_LEVEL", "info");

    if timeout_secs == 0 {
        return Err(invalid("POLICYSCAN_TIMEOUT_SECS", "must be greater than zero".to_string()));
    }

    Ok(AppConfig {
        api_key,
        completion_url,
        model,
        mode,
        detection,
        page_text_mode,
        max_content_chars,
        timeout_secs,
        max_retries,
        retry_backoff_base_ms,
        user_agent,
        log_level,
    })
}

fn parse_mode(s: &str) -> Result<PromptMode, ConfigError> {
    PromptMode::from_name(s).ok_or_else(|| ConfigError::InvalidEnvVar {
        var: "POLICYSCAN_MODE".to_string(),
        reason: format!("expected narrative or structured, got '{s}'"),
    })
}

fn parse_detection(s: &str) -> Result<DetectionStrategy, ConfigError> {
    DetectionStrategy::from_name(s).ok_or_else(|| ConfigError::InvalidEnvVar {
        var: "POLICYSCAN_DETECTION".to_string(),
        reason: format!("expected elements or attributes, got '{s}'"),
    })
}

fn parse_bool(var: &str, s: &str) -> Result<bool, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: format!("expected a boolean, got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
