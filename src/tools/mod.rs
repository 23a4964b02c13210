//! Capabilities the research stages can call
//!
//! - [`search`]: `web_search` (Tavily or DuckDuckGo) and `crawl` (reader proxy)
//! - [`python`]: `python_executor`
//! - [`handoff`]: the coordinator's `handoff_to_planner` declaration
//! - [`registry`]: the [`Tool`] trait and the name → handler table

pub mod handoff;
pub mod python;
pub mod registry;
pub mod search;

pub use python::PythonExecutorTool;
pub use registry::{Tool, ToolRegistry};
pub use search::{CrawlTool, WebSearchTool};

use crate::types::Result;
use crate::utils::config::ResearchConfig;
use std::sync::Arc;

/// Registry with the built-in `web_search`, `crawl` and `python_executor` tools.
pub fn default_registry(config: &ResearchConfig) -> Result<ToolRegistry> {
    Ok(ToolRegistry::new()
        .with_tool(Arc::new(WebSearchTool::from_config(&config.search)?))
        .with_tool(Arc::new(CrawlTool::from_config(&config.crawl)))
        .with_tool(Arc::new(PythonExecutorTool::from_config(&config.code))))
}
