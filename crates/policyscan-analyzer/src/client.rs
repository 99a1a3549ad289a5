//! HTTP client for an OpenAI-compatible chat-completions endpoint.
//!
//! One [`CompletionClient::send`] is one logical exchange: a POST with the
//! instruction as the sole user message, bounded retry on transient failures,
//! and an overall timeout. Whatever goes wrong, the caller gets a
//! [`PipelineError`], never a panic.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use policyscan_core::{AppConfig, CompletionAnswer, CompletionRequest, PipelineError, PromptMode};
use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::retry::{retry_with_backoff, Backoff};

/// Bytes of a non-success response body kept for diagnostics.
const MAX_ERROR_BODY_BYTES: usize = 2 * 1024;

/// Sends completion requests. [`CompletionClient`] is the production
/// implementation; the seam lets the scan pipeline run against anything
/// that answers a [`CompletionRequest`].
pub trait CompletionBackend: Send + Sync {
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl Future<Output = Result<CompletionAnswer, PipelineError>> + Send;
}

#[derive(Clone)]
pub struct CompletionClientConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff_base_ms: u64,
    pub user_agent: String,
}

impl CompletionClientConfig {
    /// Config with a 30 s timeout and no retries.
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(30),
            max_retries: 0,
            backoff_base_ms: 0,
            user_agent: policyscan_core::config::DEFAULT_USER_AGENT.to_string(),
        }
    }

    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            endpoint: config.completion_url.clone(),
            api_key: config.api_key.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            backoff_base_ms: config.retry_backoff_base_ms,
            user_agent: config.user_agent.clone(),
        }
    }
}

impl fmt::Debug for CompletionClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClientConfig")
            .field("endpoint", &self.endpoint)
            .field("api_key", &"[redacted]")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff_base_ms", &self.backoff_base_ms)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

pub struct CompletionClient {
    client: Client,
    endpoint: Url,
    config: CompletionClientConfig,
}

impl CompletionClient {
    /// # Errors
    ///
    /// Returns [`CompletionError::InvalidEndpoint`] if the endpoint is not an
    /// absolute URL, or [`CompletionError::Http`] if the underlying
    /// `reqwest::Client` cannot be constructed.
    pub fn new(config: CompletionClientConfig) -> Result<Self, CompletionError> {
        let endpoint =
            Url::parse(&config.endpoint).map_err(|e| CompletionError::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                reason: e.to_string(),
            })?;
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self {
            client,
            endpoint,
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &CompletionClientConfig {
        &self.config
    }

    /// Sends `request` and returns the first choice's message content.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::Timeout`] if the exchange, retries included, exceeds
    ///   the configured timeout.
    /// - [`PipelineError::TransportFailure`] on network failure, a non-success
    ///   status, or an envelope without `choices[0].message.content`.
    pub async fn send(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionAnswer, PipelineError> {
        let body = ChatCompletionBody::from_request(request);
        let backoff = Backoff::new(self.config.max_retries, self.config.backoff_base_ms);
        let exchange = retry_with_backoff(backoff, || self.send_once(&body));

        match tokio::time::timeout(self.config.timeout, exchange).await {
            Ok(Ok(content)) => Ok(CompletionAnswer(content)),
            Ok(Err(CompletionError::Http(e))) if e.is_timeout() => Err(PipelineError::Timeout {
                secs: self.config.timeout.as_secs(),
            }),
            Ok(Err(err)) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    error = %err,
                    "completion request failed"
                );
                Err(err.into())
            }
            Err(_) => {
                tracing::warn!(
                    endpoint = %self.endpoint,
                    timeout_secs = self.config.timeout.as_secs(),
                    "completion request timed out"
                );
                Err(PipelineError::Timeout {
                    secs: self.config.timeout.as_secs(),
                })
            }
        }
    }

    async fn send_once(&self, body: &ChatCompletionBody<'_>) -> Result<String, CompletionError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.config.api_key)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = retry_after_secs(response.headers());
            let body = read_limited_text(response, MAX_ERROR_BODY_BYTES).await;
            return Err(CompletionError::UnexpectedStatus {
                status: status.as_u16(),
                body,
                retry_after,
            });
        }

        let raw = response.text().await?;
        let envelope: ChatCompletionResponse =
            serde_json::from_str(&raw).map_err(CompletionError::Deserialize)?;
        envelope.into_content()
    }
}

impl CompletionBackend for CompletionClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionAnswer, PipelineError> {
        self.send(request).await
    }
}

/// `Retry-After` in its delta-seconds form. HTTP-date values are ignored.
fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

async fn read_limited_text(response: reqwest::Response, max_bytes: usize) -> String {
    match response.bytes().await {
        Ok(bytes) => {
            let end = bytes.len().min(max_bytes);
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        }
        Err(e) => {
            tracing::warn!(error = %e, "failed to read completion error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

impl<'a> ChatCompletionBody<'a> {
    fn from_request(request: &'a CompletionRequest) -> Self {
        Self {
            model: &request.model,
            messages: [ChatMessage {
                role: "user",
                content: &request.instruction,
            }],
            response_format: match request.mode {
                PromptMode::Structured => Some(ResponseFormat {
                    kind: "json_object",
                }),
                PromptMode::Narrative => None,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    #[serde(default)]
    message: Option<ChatCompletionMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

impl ChatCompletionResponse {
    fn into_content(self) -> Result<String, CompletionError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or(CompletionError::MissingField("choices[0]"))?;
        let message = choice
            .message
            .ok_or(CompletionError::MissingField("choices[0].message"))?;
        message
            .content
            .ok_or(CompletionError::MissingField("choices[0].message.content"))
    }
}
