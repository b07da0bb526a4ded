use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::{core::LowLevelClient, error::TransportError};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum MockResponse {
    Text(String),
    /// Reply after sleeping, to simulate a slow provider.
    Delayed(Duration, String),
    Error(TransportError),
}

impl MockResponse {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Text(s.into())
    }
}

#[derive(Debug, Default)]
struct MockState {
    responses: VecDeque<MockResponse>,
    prompts: Vec<String>,
}

/// Control side of a [`MockClient`]: queue replies and inspect received prompts.
#[derive(Debug, Default)]
pub struct MockHandle {
    state: Mutex<MockState>,
}

impl MockHandle {
    fn state(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, response: MockResponse) {
        self.state().responses.push_back(response);
    }

    pub fn push_text(&self, text: impl Into<String>) {
        self.push(MockResponse::text(text));
    }

    pub fn push_error(&self, error: TransportError) {
        self.push(MockResponse::Error(error));
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.state().prompts.clone()
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.state().prompts.last().cloned()
    }

    pub fn remaining(&self) -> usize {
        self.state().responses.len()
    }
}

/// Scripted client for tests and offline runs. Replies are consumed in order;
/// an exhausted script yields `TransportError::Mock`.
#[derive(Debug, Clone)]
pub struct MockClient {
    handle: Arc<MockHandle>,
}

impl MockClient {
    pub fn new() -> (Self, Arc<MockHandle>) {
        let handle = Arc::new(MockHandle::default());
        (Self { handle: handle.clone() }, handle)
    }

    pub fn with_responses(responses: Vec<MockResponse>) -> (Self, Arc<MockHandle>) {
        let (client, handle) = Self::new();
        for response in responses {
            handle.push(response);
        }
        (client, handle)
    }
}

#[async_trait]
impl LowLevelClient for MockClient {
    async fn ask_raw(&self, prompt: String) -> Result<String, TransportError> {
        let next = {
            let mut state = self.handle.state();
            state.prompts.push(prompt);
            state.responses.pop_front()
        };
        debug!(remaining = self.handle.remaining(), "Mock client replying");

        match next {
            Some(MockResponse::Text(text)) => Ok(text),
            Some(MockResponse::Delayed(delay, text)) => {
                tokio::time::sleep(delay).await;
                Ok(text)
            }
            Some(MockResponse::Error(e)) => Err(e),
            None => Err(TransportError::Mock("no scripted response left".to_string())),
        }
    }

    fn clone_box(&self) -> Box<dyn LowLevelClient> {
        Box::new(self.clone())
    }
}
