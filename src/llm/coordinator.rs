//! Tool Coordinator for Multi-Turn Tool Calling
//!
//! `ToolCoordinator` works with any `LLMClient` implementation and runs the
//! complete tool calling loop:
//!
//! 1. Send the history with the declared tools to the LLM
//! 2. If the model requests tool calls, execute them in the order returned
//! 3. Append the assistant turn and one tool message per call
//! 4. Repeat until the model answers without tool calls
//!
//! A model that keeps calling tools is stopped after `max_iterations`
//! round-trips with [`AppError::ToolLoopExhausted`]. Unknown tool names and
//! malformed arguments are protocol violations and always abort the loop.
//!
//! # Example
//!
//! ```rust,ignore
//! use tiny_research::llm::coordinator::{ToolCoordinator, ToolCallingConfig};
//!
//! let coordinator = ToolCoordinator::new(client, registry.scoped(&["crawl"])?, ToolCallingConfig::default());
//! let result = coordinator.execute(messages, &cancel).await?;
//! println!("{} after {} tool calls", result.content, result.tool_calls.len());
//! ```

use crate::llm::client::{LLMClient, TokenUsage};
use crate::tools::registry::ToolRegistry;
use crate::types::{AppError, ConversationMessage, Result, ToolCall};
use crate::utils::cancel::cancellable;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Configuration for tool calling coordination behavior.
#[derive(Debug, Clone)]
pub struct ToolCallingConfig {
    /// Maximum number of LLM iterations (not tool calls) before giving up.
    /// Each iteration is one round-trip to the LLM.
    pub max_iterations: usize,

    /// Timeout for individual tool execution.
    pub tool_timeout: Duration,

    /// Feed tool failures back to the model as the tool result instead of
    /// aborting the loop. Protocol violations are never recovered.
    pub recover_tool_errors: bool,
}

impl Default for ToolCallingConfig {
    fn default() -> Self {
        Self {
            max_iterations: 20,
            tool_timeout: Duration::from_secs(60),
            recover_tool_errors: false,
        }
    }
}

/// Record of a single tool call execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRecord {
    /// Unique identifier for this tool call (from the LLM).
    pub id: String,
    /// Name of the tool that was called.
    pub name: String,
    /// Decoded arguments passed to the tool.
    pub arguments: Value,
    /// Text handed back to the model.
    pub result: String,
    /// Whether the tool execution was successful.
    pub success: bool,
    /// Time taken to execute the tool in milliseconds.
    pub duration_ms: u64,
    /// Error message if the tool failed.
    pub error: Option<String>,
}

/// Result of a complete tool coordination session.
#[derive(Debug, Clone)]
pub struct CoordinatorResult {
    /// Final text response from the model.
    pub content: String,

    /// All tool calls made during the session.
    pub tool_calls: Vec<ToolCallRecord>,

    /// Number of LLM iterations (round-trips) performed.
    pub iterations: usize,

    /// Accumulated token usage across all iterations.
    pub total_usage: TokenUsage,

    /// Full message history, including the final assistant message.
    pub message_history: Vec<ConversationMessage>,
}

/// Generic tool coordinator that works with any LLMClient.
pub struct ToolCoordinator {
    client: Arc<dyn LLMClient>,
    registry: ToolRegistry,
    config: ToolCallingConfig,
}

/// Decode the raw argument text of a call. An empty string means no arguments.
fn decode_arguments(call: &ToolCall) -> Result<Value> {
    if call.arguments.trim().is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_str(&call.arguments).map_err(|e| {
        AppError::Protocol(format!(
            "malformed arguments for tool '{}': {}",
            call.name, e
        ))
    })
}

impl ToolCoordinator {
    /// Create a new ToolCoordinator with the given client, registry, and config.
    pub fn new(
        client: Arc<dyn LLMClient>,
        registry: ToolRegistry,
        config: ToolCallingConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    /// Create a new ToolCoordinator with default configuration.
    pub fn with_defaults(client: Arc<dyn LLMClient>, registry: ToolRegistry) -> Self {
        Self::new(client, registry, ToolCallingConfig::default())
    }

    /// Execute a complete tool-calling conversation loop starting from `messages`.
    pub async fn execute(
        &self,
        mut messages: Vec<ConversationMessage>,
        cancel: &CancellationToken,
    ) -> Result<CoordinatorResult> {
        let tools = self.registry.get_tool_definitions();
        let mut all_tool_calls: Vec<ToolCallRecord> = Vec::new();
        let mut total_usage = TokenUsage::default();

        for iteration in 0..self.config.max_iterations {
            let response = cancellable(
                cancel,
                self.client
                    .generate_with_tools_and_history(&messages, &tools),
            )
            .await?;

            if let Some(usage) = response.usage {
                total_usage = total_usage.add(usage);
            }

            if response.tool_calls.is_empty() {
                messages.push(ConversationMessage::assistant(&response.content, Vec::new()));
                return Ok(CoordinatorResult {
                    content: response.content,
                    tool_calls: all_tool_calls,
                    iterations: iteration + 1,
                    total_usage,
                    message_history: messages,
                });
            }

            debug!(
                iteration = iteration + 1,
                calls = response.tool_calls.len(),
                "Model requested tool calls"
            );

            let mut results = Vec::with_capacity(response.tool_calls.len());
            for call in &response.tool_calls {
                let record = self.execute_single_tool(call, cancel).await?;
                results.push(ConversationMessage::tool_result(call, &record.result));
                all_tool_calls.push(record);
            }

            messages.push(ConversationMessage::assistant(
                &response.content,
                response.tool_calls,
            ));
            messages.extend(results);
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Tool loop did not converge"
        );
        Err(AppError::ToolLoopExhausted {
            max_iterations: self.config.max_iterations,
        })
    }

    /// Execute a single tool call with timeout.
    async fn execute_single_tool(
        &self,
        call: &ToolCall,
        cancel: &CancellationToken,
    ) -> Result<ToolCallRecord> {
        let arguments = decode_arguments(call)?;
        if !self.registry.has_tool(&call.name) {
            return Err(AppError::Protocol(format!(
                "model called undeclared tool '{}'",
                call.name
            )));
        }

        info!(tool = %call.name, "Calling tool");
        debug!(tool = %call.name, arguments = %call.arguments, "Tool arguments");

        let start = Instant::now();
        let outcome = cancellable(cancel, async {
            match timeout(
                self.config.tool_timeout,
                self.registry.execute(&call.name, arguments.clone()),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(AppError::tool(
                    &call.name,
                    format!("timed out after {:?}", self.config.tool_timeout),
                )),
            }
        })
        .await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => Ok(ToolCallRecord {
                id: call.id.clone(),
                name: call.name.clone(),
                arguments,
                result,
                success: true,
                duration_ms,
                error: None,
            }),
            Err(e @ (AppError::Cancelled | AppError::Protocol(_))) => Err(e),
            Err(e) if self.config.recover_tool_errors => {
                warn!(tool = %call.name, error = %e, "Tool failed, returning error to model");
                Ok(ToolCallRecord {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    arguments,
                    result: format!("Error: {}", e),
                    success: false,
                    duration_ms,
                    error: Some(e.to_string()),
                })
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::LLMResponse;
    use crate::llm::mock::ScriptedLLM;
    use crate::tools::registry::Tool;
    use crate::types::MessageRole;
    use async_trait::async_trait;
    use serde_json::json;

    struct Upper;

    #[async_trait]
    impl Tool for Upper {
        fn name(&self) -> &str {
            "upper"
        }

        fn description(&self) -> &str {
            "Uppercase text"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }

        async fn execute(&self, args: Value) -> Result<String> {
            Ok(args["text"].as_str().unwrap_or_default().to_uppercase())
        }
    }

    struct Broken;

    #[async_trait]
    impl Tool for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn description(&self) -> &str {
            "Always fails"
        }

        fn parameters_schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn execute(&self, _args: Value) -> Result<String> {
            Err(AppError::tool("broken", "service unavailable"))
        }
    }

    fn call(id: &str, name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: id.to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    fn coordinator(llm: Arc<ScriptedLLM>, config: ToolCallingConfig) -> ToolCoordinator {
        let registry = ToolRegistry::new()
            .with_tool(Arc::new(Upper))
            .with_tool(Arc::new(Broken));
        ToolCoordinator::new(llm, registry, config)
    }

    #[test]
    fn test_tool_calling_config_default() {
        let config = ToolCallingConfig::default();
        assert_eq!(config.max_iterations, 20);
        assert_eq!(config.tool_timeout, Duration::from_secs(60));
        assert!(!config.recover_tool_errors);
    }

    #[tokio::test]
    async fn test_no_tool_calls_returns_text() {
        let llm = Arc::new(ScriptedLLM::texts(&["final answer"]));
        let result = coordinator(llm.clone(), ToolCallingConfig::default())
            .execute(vec![ConversationMessage::user("q")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.content, "final answer");
        assert_eq!(result.iterations, 1);
        assert!(result.tool_calls.is_empty());
        assert_eq!(llm.requests()[0].tools, vec!["broken", "upper"]);
    }

    #[tokio::test]
    async fn test_tool_results_follow_assistant_turn_in_order() {
        let llm = Arc::new(ScriptedLLM::new(vec![
            Ok(LLMResponse::tool_calls(vec![
                call("c1", "upper", r#"{"text":"a"}"#),
                call("c2", "upper", r#"{"text":"b"}"#),
            ])),
            Ok(LLMResponse::text("done")),
        ]));

        let result = coordinator(llm.clone(), ToolCallingConfig::default())
            .execute(vec![ConversationMessage::user("q")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.content, "done");
        assert_eq!(result.iterations, 2);
        assert_eq!(result.tool_calls.len(), 2);

        let second = &llm.requests()[1].messages;
        assert_eq!(second.len(), 4);
        assert_eq!(second[1].role, MessageRole::Assistant);
        assert_eq!(second[1].tool_calls.len(), 2);
        assert_eq!(second[2].tool_call_id.as_deref(), Some("c1"));
        assert_eq!(second[2].content, "A");
        assert_eq!(second[3].tool_call_id.as_deref(), Some("c2"));
        assert_eq!(second[3].content, "B");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_protocol_error() {
        let llm = Arc::new(ScriptedLLM::new(vec![Ok(LLMResponse::tool_calls(vec![
            call("c1", "rm_rf", "{}"),
        ]))]));

        let err = coordinator(llm, ToolCallingConfig::default())
            .execute(vec![ConversationMessage::user("q")], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_malformed_arguments_are_protocol_error_even_when_recovering() {
        let llm = Arc::new(ScriptedLLM::new(vec![Ok(LLMResponse::tool_calls(vec![
            call("c1", "upper", "{not json"),
        ]))]));
        let config = ToolCallingConfig {
            recover_tool_errors: true,
            ..Default::default()
        };

        let err = coordinator(llm, config)
            .execute(vec![ConversationMessage::user("q")], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Protocol(_)));
    }

    #[tokio::test]
    async fn test_tool_failure_is_fatal_by_default() {
        let llm = Arc::new(ScriptedLLM::new(vec![Ok(LLMResponse::tool_calls(vec![
            call("c1", "broken", ""),
        ]))]));

        let err = coordinator(llm.clone(), ToolCallingConfig::default())
            .execute(vec![ConversationMessage::user("q")], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Tool { .. }));
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_failure_recovered_when_enabled() {
        let llm = Arc::new(ScriptedLLM::new(vec![
            Ok(LLMResponse::tool_calls(vec![call("c1", "broken", "")])),
            Ok(LLMResponse::text("worked around it")),
        ]));
        let config = ToolCallingConfig {
            recover_tool_errors: true,
            ..Default::default()
        };

        let result = coordinator(llm.clone(), config)
            .execute(vec![ConversationMessage::user("q")], &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.content, "worked around it");
        assert!(!result.tool_calls[0].success);
        let tool_msg = &llm.requests()[1].messages[2];
        assert!(tool_msg.content.contains("service unavailable"));
    }

    #[tokio::test]
    async fn test_loop_is_capped() {
        let script = (0..5)
            .map(|i| {
                Ok(LLMResponse::tool_calls(vec![call(
                    &format!("c{i}"),
                    "upper",
                    r#"{"text":"x"}"#,
                )]))
            })
            .collect();
        let llm = Arc::new(ScriptedLLM::new(script));
        let config = ToolCallingConfig {
            max_iterations: 3,
            ..Default::default()
        };

        let err = coordinator(llm.clone(), config)
            .execute(vec![ConversationMessage::user("q")], &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::ToolLoopExhausted { max_iterations: 3 }
        ));
        assert_eq!(llm.call_count(), 3);
    }
}
