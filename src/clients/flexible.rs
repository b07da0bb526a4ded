use crate::config::KeyFromEnv;
use crate::core::LowLevelClient;
use crate::error::{ConfigError, TransportError};
use async_trait::async_trait;
use std::env;
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use super::mock::{MockClient, MockHandle};

/// Environment variable consulted by [`ClientType::from_env`].
pub const CLIENT_ENV: &str = "PASIO_CLIENT";

/// Which provider backs a [`FlexibleClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientType {
    Gemini,
    DeepSeek,
    Claude,
    Mock,
}

impl FromStr for ClientType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "deepseek" => Ok(Self::DeepSeek),
            "claude" | "anthropic" => Ok(Self::Claude),
            "mock" => Ok(Self::Mock),
            _ => Err(ConfigError::UnknownClient(s.to_string())),
        }
    }
}

impl std::fmt::Display for ClientType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientType::Gemini => write!(f, "gemini"),
            ClientType::DeepSeek => write!(f, "deepseek"),
            ClientType::Claude => write!(f, "claude"),
            ClientType::Mock => write!(f, "mock"),
        }
    }
}

impl ClientType {
    /// `PASIO_CLIENT` if set, otherwise the first provider whose key is configured,
    /// falling back to Gemini so the key prompt runs. The mock is only chosen by name.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(name) = env::var(CLIENT_ENV) {
            return name.parse();
        }
        Ok(Self::detect())
    }

    fn detect() -> Self {
        #[cfg(feature = "gemini")]
        if super::gemini::GeminiClient::find_key().is_some() {
            return Self::Gemini;
        }
        #[cfg(feature = "deepseek")]
        if super::deepseek::DeepSeekClient::find_key().is_some() {
            return Self::DeepSeek;
        }
        #[cfg(feature = "anthropic")]
        if super::claude::ClaudeClient::find_key().is_some() {
            return Self::Claude;
        }
        Self::Gemini
    }
}

/// Client that wraps any LowLevelClient and picks the provider at runtime.
#[derive(Debug, Clone)]
pub struct FlexibleClient {
    inner: Arc<Mutex<Box<dyn LowLevelClient>>>,
    client_type: ClientType,
}

impl FlexibleClient {
    pub fn new(client: Box<dyn LowLevelClient>, client_type: ClientType) -> Self {
        Self { inner: Arc::new(Mutex::new(client)), client_type }
    }

    /// Build the provider for `client_type`, reading its key from the environment
    /// (and the terminal, if interactive). Mock clients get an empty script; use
    /// [`FlexibleClient::mock`] to keep the handle.
    pub fn from_type(client_type: ClientType) -> Result<Self, ConfigError> {
        let client: Box<dyn LowLevelClient> = match client_type {
            #[cfg(feature = "gemini")]
            ClientType::Gemini => Box::new(super::gemini::GeminiClient::from_env()?),
            #[cfg(feature = "deepseek")]
            ClientType::DeepSeek => Box::new(super::deepseek::DeepSeekClient::from_env()?),
            #[cfg(feature = "anthropic")]
            ClientType::Claude => Box::new(super::claude::ClaudeClient::from_env()?),
            ClientType::Mock => Box::new(MockClient::new().0),
            #[allow(unreachable_patterns)]
            other => return Err(ConfigError::UnknownClient(format!("{other} (feature disabled)"))),
        };
        Ok(Self::new(client, client_type))
    }

    /// A FlexibleClient over a fresh mock, with the handle to script it.
    pub fn mock() -> (Self, Arc<MockHandle>) {
        let (client, handle) = MockClient::new();
        (Self::new(Box::new(client), ClientType::Mock), handle)
    }

    pub fn client_type(&self) -> ClientType {
        self.client_type
    }

    pub fn into_inner(self) -> Box<dyn LowLevelClient> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).clone_box()
    }
}

#[async_trait]
impl LowLevelClient for FlexibleClient {
    async fn ask_raw(&self, prompt: String) -> Result<String, TransportError> {
        // Clone the client to avoid holding the mutex across await
        let client = {
            let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            inner.as_ref().clone_box()
        };

        client.ask_raw(prompt).await
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }
}
