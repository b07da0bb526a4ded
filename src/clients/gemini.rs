use super::{build_http_client, status_error};
use crate::config::KeyFromEnv;
use crate::core::LowLevelClient;
use crate::error::{ConfigError, TransportError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GeminiModel {
    #[default]
    Flash25,
    Pro25,
    FlashLite25,
    Override(String),
}

impl GeminiModel {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Flash25 => "gemini-2.5-flash",
            Self::Pro25 => "gemini-2.5-pro",
            Self::FlashLite25 => "gemini-2.5-flash-lite",
            Self::Override(s) => s.as_str(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiResponse {
    /// Concatenated text parts of the first candidate.
    fn into_text(self) -> Result<String, TransportError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            warn!(block_reason = %reason, "Gemini blocked the prompt");
            return Err(TransportError::Api { status: 200, message: format!("prompt blocked: {reason}") });
        }

        let candidate = self.candidates.into_iter().next().ok_or(TransportError::EmptyResponse)?;
        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.trim().is_empty() {
            warn!(finish_reason = ?candidate.finish_reason, "Gemini candidate carried no text");
            return Err(TransportError::EmptyResponse);
        }
        Ok(text)
    }
}

/// Configuration for the Gemini client
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: GeminiModel,
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub base_url: String,
    /// No timeout when `None`: a hung provider call blocks until the caller gives up.
    pub timeout: Option<Duration>,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: GeminiModel::default(),
            max_output_tokens: 8192,
            temperature: 0.7,
            base_url: GEMINI_BASE_URL.to_string(),
            timeout: None,
        }
    }
}

impl GeminiConfig {
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self { api_key: api_key.into(), ..Default::default() }
    }

    #[must_use]
    pub fn with_model(mut self, model: GeminiModel) -> Self {
        self.model = model;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[derive(Clone, Debug)]
pub struct GeminiClient {
    config: GeminiConfig,
    client: Client,
}

impl KeyFromEnv for GeminiClient {
    const KEY_NAME: &'static str = "GEMINI_API_KEY";
    const FALLBACK_KEY_NAMES: &'static [&'static str] = &["EXPO_PUBLIC_GEMINI_API_KEY"];
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        info!(model = %config.model.id(), "Creating new Gemini client");
        let client = build_http_client(config.timeout);
        Self { config, client }
    }

    /// Client with the key found in the environment, prompting on the terminal if absent.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = Self::find_key_with_user()?;
        Ok(Self::new(GeminiConfig::new(api_key)))
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model.id()
        )
    }

    fn request_body(&self, prompt: String) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                role: Some("user".to_string()),
                parts: vec![GeminiPart { text: Some(prompt) }],
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                max_output_tokens: self.config.max_output_tokens,
            },
        }
    }
}

/// Gemini reports a bad key as 400 INVALID_ARGUMENT rather than 401.
fn gemini_status_error(status: StatusCode, body: String) -> TransportError {
    if status == StatusCode::BAD_REQUEST && body.contains("API_KEY_INVALID") {
        return TransportError::Authentication;
    }
    status_error(status, body)
}

#[async_trait]
impl LowLevelClient for GeminiClient {
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len(), model = %self.config.model.id()))]
    async fn ask_raw(&self, prompt: String) -> Result<String, TransportError> {
        debug!(model = %self.config.model.id(), prompt_len = prompt.len(), "Preparing Gemini API request");

        let request = self.request_body(prompt);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "HTTP request failed");
                TransportError::Http(e.to_string())
            })?;

        debug!(status = %response.status(), "Received response from Gemini API");

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, error = %error_text, "Gemini API error");
            return Err(gemini_status_error(status, error_text));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse Gemini response JSON");
            TransportError::Http(e.to_string())
        })?;

        debug!(candidates = gemini_response.candidates.len(), "Parsed Gemini response");

        let result = gemini_response.into_text();
        match &result {
            Ok(text) => info!(response_len = text.len(), "Successfully received Gemini response"),
            Err(e) => error!(error = %e, "Failed to extract content from Gemini response"),
        }
        result
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_body_matches_generate_content_shape() {
        let client = GeminiClient::new(GeminiConfig::new("k"));
        let body = serde_json::to_value(client.request_body("halo".to_string())).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "halo");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
    }

    #[test]
    fn endpoint_uses_model_id() {
        let config = GeminiConfig { base_url: "http://localhost:9/".into(), ..GeminiConfig::new("k") };
        let client = GeminiClient::new(config);
        assert_eq!(client.endpoint(), "http://localhost:9/v1beta/models/gemini-2.5-flash:generateContent");
    }

    #[test]
    fn response_text_joins_parts() {
        let raw = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"[1,"},{"text":"2]"}]},"finishReason":"STOP"}]}"#;
        let parsed: GeminiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.into_text().unwrap(), "[1,2]");
    }

    #[test]
    fn response_without_candidates_is_empty() {
        let parsed: GeminiResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(parsed.into_text().unwrap_err(), TransportError::EmptyResponse);
    }

    #[test]
    fn invalid_key_maps_to_authentication() {
        let err = gemini_status_error(StatusCode::BAD_REQUEST, r#"{"error":{"status":"INVALID_ARGUMENT","details":[{"reason":"API_KEY_INVALID"}]}}"#.into());
        assert_eq!(err, TransportError::Authentication);
        assert_eq!(gemini_status_error(StatusCode::TOO_MANY_REQUESTS, String::new()), TransportError::RateLimit);
    }
}
