use crate::agents::{base_vars, record_step_result, task_message, Agent};
use crate::llm::coordinator::{ToolCallingConfig, ToolCoordinator};
use crate::llm::LLMClient;
use crate::prompts::TemplateRenderer;
use crate::research::AgentState;
use crate::tools::ToolRegistry;
use crate::types::{AgentOutput, ConversationMessage, Node, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Capabilities available to the researcher.
pub const RESEARCHER_TOOLS: &[&str] = &["crawl", "web_search"];

/// Executes `research` steps with web search and page crawling.
pub struct ResearcherAgent {
    llm: Arc<dyn LLMClient>,
    templates: Arc<dyn TemplateRenderer>,
    tools: ToolRegistry,
    tool_config: ToolCallingConfig,
}

impl ResearcherAgent {
    /// Fails if `registry` lacks any of [`RESEARCHER_TOOLS`].
    pub fn new(
        llm: Arc<dyn LLMClient>,
        templates: Arc<dyn TemplateRenderer>,
        registry: &ToolRegistry,
        tool_config: ToolCallingConfig,
    ) -> Result<Self> {
        Ok(Self {
            llm,
            templates,
            tools: registry.scoped(RESEARCHER_TOOLS)?,
            tool_config,
        })
    }
}

#[async_trait]
impl Agent for ResearcherAgent {
    async fn execute(
        &self,
        state: &mut AgentState,
        cancel: &CancellationToken,
    ) -> Result<AgentOutput> {
        let Some((idx, step)) = state.next_pending_step() else {
            return Ok(AgentOutput::route(Node::ResearchTeam));
        };
        info!(step = idx, title = %step.title, "Researcher started");

        let system = self
            .templates
            .render("researcher", &base_vars(&state.locale))?;
        let messages = vec![ConversationMessage::system(system), task_message(step)];

        let coordinator = ToolCoordinator::new(
            Arc::clone(&self.llm),
            self.tools.clone(),
            self.tool_config.clone(),
        );
        let result = coordinator.execute(messages, cancel).await?;

        info!(
            step = idx,
            iterations = result.iterations,
            tool_calls = result.tool_calls.len(),
            "Researcher finished"
        );
        record_step_result(state, idx, result.content)
    }

    fn node(&self) -> Node {
        Node::Researcher
    }
}
