use super::{build_http_client, status_error};
use crate::config::KeyFromEnv;
use crate::core::LowLevelClient;
use crate::error::{ConfigError, TransportError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument};

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ClaudeModel {
    #[default]
    Haiku35,
    Sonnet4,
    Override(String),
}

impl ClaudeModel {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Haiku35 => "claude-3-5-haiku-20241022",
            Self::Sonnet4 => "claude-sonnet-4-20250514",
            Self::Override(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(default)]
    text: Option<String>,
}

#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: ClaudeModel,
    pub max_tokens: u32,
    pub timeout: Option<Duration>,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: ClaudeModel::default(),
            max_tokens: 8192,
            timeout: None,
        }
    }
}

/// Anthropic Messages API client.
#[derive(Clone, Debug)]
pub struct ClaudeClient {
    config: ClaudeConfig,
    client: Client,
}

impl KeyFromEnv for ClaudeClient {
    const KEY_NAME: &'static str = "ANTHROPIC_API_KEY";
}

impl ClaudeClient {
    pub fn new(config: ClaudeConfig) -> Self {
        info!(model = %config.model.id(), "Creating new Claude client");
        let client = build_http_client(config.timeout);
        Self { config, client }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = Self::find_key_with_user()?;
        Ok(Self::new(ClaudeConfig { api_key, ..Default::default() }))
    }
}

#[async_trait]
impl LowLevelClient for ClaudeClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), model = %self.config.model.id()))]
    async fn ask_raw(&self, prompt: String) -> Result<String, TransportError> {
        let request = ClaudeRequest {
            model: self.config.model.id(),
            max_tokens: self.config.max_tokens,
            messages: vec![ClaudeMessage { role: "user", content: prompt }],
        };

        debug!("Sending request to Anthropic API");
        let response = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                TransportError::Http(e.to_string())
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Anthropic API error");
            return Err(status_error(status, error_text));
        }

        let parsed: ClaudeResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Anthropic response JSON");
            TransportError::Http(e.to_string())
        })?;

        let text: String = parsed.content.into_iter().filter_map(|c| c.text).collect();
        if text.trim().is_empty() {
            return Err(TransportError::EmptyResponse);
        }

        info!(response_len = text.len(), "Successfully received Anthropic response");
        Ok(text)
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }
}
