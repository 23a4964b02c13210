//! LLM client abstraction
//!
//! Every stage talks to the model through [`LLMClient`]. Implementations only
//! provide [`LLMClient::complete`]; the remaining methods are conveniences
//! built on top of it.

use crate::types::{ConversationMessage, Result, ToolCall, ToolDefinition};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One chat-completion request.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Full conversation history, oldest first.
    pub messages: &'a [ConversationMessage],
    /// Capabilities the model may call. Empty means no tool calling.
    pub tools: &'a [ToolDefinition],
    /// Ask the provider to constrain output to a JSON object.
    pub json_mode: bool,
}

impl<'a> CompletionRequest<'a> {
    pub fn new(messages: &'a [ConversationMessage]) -> Self {
        Self {
            messages,
            tools: &[],
            json_mode: false,
        }
    }

    pub fn with_tools(mut self, tools: &'a [ToolDefinition]) -> Self {
        self.tools = tools;
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }
}

/// Generic LLM client trait for provider abstraction
#[async_trait]
pub trait LLMClient: Send + Sync {
    /// Run one completion against the provider.
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<LLMResponse>;

    /// Get the model name/identifier
    fn model_name(&self) -> &str;

    /// Generate plain text from the conversation history.
    async fn generate_with_history(&self, messages: &[ConversationMessage]) -> Result<String> {
        Ok(self.complete(CompletionRequest::new(messages)).await?.content)
    }

    /// Generate with tool calling support over the conversation history.
    async fn generate_with_tools_and_history(
        &self,
        messages: &[ConversationMessage],
        tools: &[ToolDefinition],
    ) -> Result<LLMResponse> {
        self.complete(CompletionRequest::new(messages).with_tools(tools))
            .await
    }

    /// Generate text in JSON mode. The output is not decoded here.
    async fn generate_json(&self, messages: &[ConversationMessage]) -> Result<String> {
        Ok(self
            .complete(CompletionRequest::new(messages).json())
            .await?
            .content)
    }
}

/// Response from an LLM generation request
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    /// The text content of the response
    pub content: String,
    /// Any tool calls requested by the model
    pub tool_calls: Vec<ToolCall>,
    /// The reason generation stopped (e.g., "stop", "tool_calls", "length")
    pub finish_reason: String,
    /// Token accounting, when the provider reports it
    pub usage: Option<TokenUsage>,
}

impl LLMResponse {
    /// A plain text response with no tool calls.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            tool_calls: Vec::new(),
            finish_reason: "stop".to_string(),
            usage: None,
        }
    }

    /// A response requesting the given tool calls.
    pub fn tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: String::new(),
            tool_calls,
            finish_reason: "tool_calls".to_string(),
            usage: None,
        }
    }
}

/// Token usage reported by a provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens + completion_tokens,
        }
    }

    /// Sum of two usages.
    pub fn add(self, other: TokenUsage) -> Self {
        Self::new(
            self.prompt_tokens + other.prompt_tokens,
            self.completion_tokens + other.completion_tokens,
        )
    }
}
