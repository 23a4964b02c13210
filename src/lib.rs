//! # tiny-research
//!
//! A small LLM research workflow engine. A query goes through a graph of
//! stages. A coordinator decides whether the query needs research at all. A
//! planner breaks it into steps. Researcher and coder stages execute those
//! steps with web search, page crawling and Python. A reporter turns the
//! findings into a markdown report.
//!
//! ## Overview
//!
//! tiny-research can be used in two ways:
//!
//! 1. **As a CLI**: run `tiny-research research "<query>"`
//! 2. **As a library**: build a [`WorkflowEngine`] and call it from your own code
//!
//! ## Quick Start (Library Usage)
//!
//! ```rust,ignore
//! use tiny_research::{ResearchConfig, WorkflowEngine};
//!
//! #[tokio::main]
//! async fn main() -> tiny_research::Result<()> {
//!     let config = ResearchConfig::load_or_default("research.toml")?;
//!     let engine = WorkflowEngine::from_config(&config)?;
//!     let report = engine.research("What is the GDP of France?").await?;
//!     println!("{}", report);
//!     Ok(())
//! }
//! ```
//!
//! ### Custom model backends
//!
//! Any [`LLMClient`] can drive the engine. Tests use scripted clients; the
//! binary uses [`llm::OpenAIClient`] against an OpenAI-compatible endpoint.
//!
//! ```rust,ignore
//! use tiny_research::{prompts::PromptTemplates, tools, WorkflowEngine};
//! use std::sync::Arc;
//!
//! let engine = WorkflowEngine::new(
//!     Arc::new(my_client),
//!     Arc::new(PromptTemplates::new()),
//!     tools::default_registry(&config)?,
//!     config.workflow.clone(),
//! )?;
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `duckduckgo` | Keyless DuckDuckGo search when no Tavily key is set (default) |

/// Workflow stages (coordinator, planner, researcher, coder, reporter).
pub mod agents;
/// Command-line parsing and terminal output.
pub mod cli;
/// LLM clients, structured output and the tool-calling loop.
pub mod llm;
/// System prompt templates.
pub mod prompts;
/// Plan, steps and per-run state.
pub mod research;
/// Built-in tools (web search, crawl, Python).
pub mod tools;
/// Core types (messages, routing, errors).
pub mod types;
/// Configuration and cancellation helpers.
pub mod utils;
/// Engine driving a run through the stage graph.
pub mod workflows;

// Re-export commonly used types
pub use llm::{LLMClient, LLMResponse};
pub use research::{AgentState, Plan, Step, StepType};
pub use tools::registry::ToolRegistry;
pub use types::{AppError, Result};
pub use utils::config::ResearchConfig;
pub use workflows::{WorkflowEngine, WorkflowOutput, WorkflowStep};
