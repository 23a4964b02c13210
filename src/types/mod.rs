use serde::{Deserialize, Serialize};
use std::fmt;

// ============= Conversation Types =============

/// Role of a message sender in the shared conversation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions rendered from a template.
    System,
    /// The user's query and stage task framings.
    User,
    /// Model output.
    Assistant,
    /// Result of a capability call.
    Tool,
}

impl MessageRole {
    /// Wire name used by chat-completion APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

/// A message in the conversation history.
///
/// Assistant messages may carry the tool calls the model requested; tool
/// messages carry the id and name of the call they answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationMessage {
    /// The role of the message sender.
    pub role: MessageRole,
    /// The text content of the message.
    pub content: String,
    /// Tool calls requested by the assistant (only for Assistant role).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// Id of the call this message answers (only for Tool role).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// Name of the tool that produced this result (only for Tool role).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ConversationMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message with optional tool calls.
    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::new(MessageRole::Assistant, content)
        }
    }

    /// Create a tool result message answering `call`.
    pub fn tool_result(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            name: Some(call.name.clone()),
            ..Self::new(MessageRole::Tool, content)
        }
    }
}

// ============= Tool Types =============

/// A capability declared to the model: name plus JSON schema of its arguments.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: serde_json::Value,
}

/// A capability call requested by the model.
///
/// `arguments` is kept as the raw JSON text the model produced so that
/// malformed arguments can be reported instead of silently replaced.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: String,
}

// ============= Workflow Types =============

/// The workflow's named stages plus the terminal sentinel.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Node {
    Coordinator,
    Planner,
    ResearchTeam,
    Researcher,
    Coder,
    Reporter,
    /// Stops the workflow loop.
    End,
}

impl Node {
    pub fn as_str(&self) -> &'static str {
        match self {
            Node::Coordinator => "coordinator",
            Node::Planner => "planner",
            Node::ResearchTeam => "research_team",
            Node::Researcher => "researcher",
            Node::Coder => "coder",
            Node::Reporter => "reporter",
            Node::End => "__end__",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Node::End)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stage hands back to the engine: where to go next and its output text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOutput {
    pub next: Node,
    pub output: String,
}

impl AgentOutput {
    /// Route to `next` without output.
    pub fn route(next: Node) -> Self {
        Self {
            next,
            output: String::new(),
        }
    }

    pub fn with_output(next: Node, output: impl Into<String>) -> Self {
        Self {
            next,
            output: output.into(),
        }
    }
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Tool '{name}' failed: {message}")]
    Tool { name: String, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("GenerateJSON failed after {attempts} attempt(s): {source}")]
    GenerateJson {
        attempts: usize,
        #[source]
        source: Box<AppError>,
    },

    #[error("Protocol violation: {0}")]
    Protocol(String),

    #[error("Tool loop exhausted after {max_iterations} iterations")]
    ToolLoopExhausted { max_iterations: usize },

    #[error("Run cancelled")]
    Cancelled,

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Build a capability failure for `name`.
    pub fn tool(name: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Tool {
            name: name.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
