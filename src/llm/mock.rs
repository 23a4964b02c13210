//! Scripted LLM client for unit tests.

use crate::llm::client::{CompletionRequest, LLMClient, LLMResponse};
use crate::types::{AppError, ConversationMessage, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

/// What the mock saw for one `complete` call.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<String>,
    pub json_mode: bool,
}

/// Replays a fixed list of responses, one per call, and records every request.
pub struct ScriptedLLM {
    script: Mutex<VecDeque<Result<LLMResponse>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
}

impl ScriptedLLM {
    pub fn new(script: Vec<Result<LLMResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    /// Convenience for a script of plain text replies.
    pub fn texts(replies: &[&str]) -> Self {
        Self::new(
            replies
                .iter()
                .map(|r| Ok(LLMResponse::text(*r)))
                .collect(),
        )
    }

    /// Sleep before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl LLMClient for ScriptedLLM {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<LLMResponse> {
        self.requests.lock().push(RecordedRequest {
            messages: request.messages.to_vec(),
            tools: request.tools.iter().map(|t| t.name.clone()).collect(),
            json_mode: request.json_mode,
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::LLM("script exhausted".to_string())))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}
