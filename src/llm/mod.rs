//! LLM client and the two protocols built on it
//!
//! - [`client`]: the [`LLMClient`] trait every stage talks to
//! - [`openai`]: an OpenAI-compatible chat-completions client
//! - [`structured`]: JSON generation with fence stripping, validation and bounded retry
//! - [`coordinator`]: the multi-turn tool calling loop

/// Core LLM client trait and response types.
pub mod client;
/// Multi-turn tool calling loop.
pub mod coordinator;
pub mod openai;
pub mod structured;

#[cfg(test)]
pub(crate) mod mock;

pub use client::{CompletionRequest, LLMClient, LLMResponse, TokenUsage};
pub use coordinator::{CoordinatorResult, ToolCallRecord, ToolCallingConfig, ToolCoordinator};
pub use openai::OpenAIClient;
pub use structured::{generate_structured, strip_code_fences, Structured, Validate};
