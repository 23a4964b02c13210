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

pub const CODER_TOOLS: &[&str] = &["python_executor"];

/// Executes `processing` steps with Python, given the findings so far.
pub struct CoderAgent {
    llm: Arc<dyn LLMClient>,
    templates: Arc<dyn TemplateRenderer>,
    tools: ToolRegistry,
    tool_config: ToolCallingConfig,
}

impl CoderAgent {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        templates: Arc<dyn TemplateRenderer>,
        registry: &ToolRegistry,
        tool_config: ToolCallingConfig,
    ) -> Result<Self> {
        Ok(Self {
            llm,
            templates,
            tools: registry.scoped(CODER_TOOLS)?,
            tool_config,
        })
    }
}

/// Every completed step's result, numbered in plan order.
fn existing_findings(state: &AgentState) -> ConversationMessage {
    let findings: Vec<String> = state
        .completed_steps()
        .enumerate()
        .map(|(i, step)| {
            format!(
                "## Existing Finding {}: {}\n\n<finding>\n{}\n</finding>",
                i + 1,
                step.title,
                step.execution_result
            )
        })
        .collect();

    let body = if findings.is_empty() {
        "No findings yet.".to_string()
    } else {
        findings.join("\n\n")
    };
    ConversationMessage::user(format!("# Existing Findings\n\n{}", body))
}

#[async_trait]
impl Agent for CoderAgent {
    async fn execute(
        &self,
        state: &mut AgentState,
        cancel: &CancellationToken,
    ) -> Result<AgentOutput> {
        let Some((idx, step)) = state.next_pending_step() else {
            return Ok(AgentOutput::route(Node::ResearchTeam));
        };
        info!(step = idx, title = %step.title, "Coder started");

        let system = self.templates.render("coder", &base_vars(&state.locale))?;
        let messages = vec![
            ConversationMessage::system(system),
            task_message(step),
            existing_findings(state),
        ];

        let result = ToolCoordinator::new(
            Arc::clone(&self.llm),
            self.tools.clone(),
            self.tool_config.clone(),
        )
        .execute(messages, cancel)
        .await?;

        info!(step = idx, iterations = result.iterations, "Coder finished");
        record_step_result(state, idx, result.content)
    }

    fn node(&self) -> Node {
        Node::Coder
    }
}
