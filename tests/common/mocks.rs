//! Mock implementations for testing.
//!
//! This module provides a scripted LLM client and canned tools that can be
//! used across different test files without duplication.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use tiny_research::llm::{CompletionRequest, LLMClient, LLMResponse};
use tiny_research::prompts::PromptTemplates;
use tiny_research::tools::{Tool, ToolRegistry};
use tiny_research::types::{AppError, ConversationMessage, Result, ToolCall};

/// One request as seen by [`ScriptedClient`].
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub messages: Vec<ConversationMessage>,
    pub tools: Vec<String>,
    pub json_mode: bool,
}

/// LLM client replaying a fixed script of responses, one per call.
///
/// # Examples
///
/// ```ignore
/// let client = ScriptedClient::new(vec![
///     Ok(ScriptedClient::call("c1", "web_search", json!({"query": "rust"}))),
///     Ok(LLMResponse::text("done")),
/// ]);
/// ```
pub struct ScriptedClient {
    script: Mutex<VecDeque<Result<LLMResponse>>>,
    seen: Mutex<Vec<SeenRequest>>,
}

impl ScriptedClient {
    pub fn new(script: Vec<Result<LLMResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// A response requesting exactly one tool call.
    pub fn call(id: &str, name: &str, arguments: Value) -> LLMResponse {
        LLMResponse::tool_calls(vec![ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }])
    }

    /// The coordinator's handoff to the planner.
    pub fn handoff() -> LLMResponse {
        Self::call("handoff-1", "handoff_to_planner", json!({}))
    }

    pub fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().len()
    }
}

#[async_trait]
impl LLMClient for ScriptedClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<LLMResponse> {
        self.seen.lock().push(SeenRequest {
            messages: request.messages.to_vec(),
            tools: request.tools.iter().map(|t| t.name.clone()).collect(),
            json_mode: request.json_mode,
        });
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(AppError::LLM("no scripted response left".to_string())))
    }

    fn model_name(&self) -> &str {
        "scripted-test"
    }
}

/// Tool returning a canned reply (or failing) and recording its arguments.
pub struct MockTool {
    name: String,
    reply: std::result::Result<String, String>,
    pub calls: Mutex<Vec<Value>>,
}

impl MockTool {
    pub fn new(name: &str, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply: Ok(reply.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(name: &str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            reply: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl Tool for MockTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "mock tool"
    }

    fn parameters_schema(&self) -> Value {
        json!({"type": "object", "properties": {}})
    }

    async fn execute(&self, args: Value) -> Result<String> {
        self.calls.lock().push(args);
        self.reply
            .clone()
            .map_err(|message| AppError::tool(self.name.clone(), message))
    }
}

/// Canned versions of the three built-in capabilities.
pub struct MockTools {
    pub search: Arc<MockTool>,
    pub crawl: Arc<MockTool>,
    pub python: Arc<MockTool>,
}

impl MockTools {
    pub fn new(search: &str, crawl: &str, python: &str) -> Self {
        Self {
            search: MockTool::new("web_search", search),
            crawl: MockTool::new("crawl", crawl),
            python: MockTool::new("python_executor", python),
        }
    }

    pub fn registry(&self) -> ToolRegistry {
        ToolRegistry::new()
            .with_tool(self.search.clone())
            .with_tool(self.crawl.clone())
            .with_tool(self.python.clone())
    }
}

pub fn templates() -> Arc<PromptTemplates> {
    Arc::new(PromptTemplates::new())
}
