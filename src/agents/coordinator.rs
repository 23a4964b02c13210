use crate::agents::{base_vars, Agent};
use crate::llm::LLMClient;
use crate::prompts::TemplateRenderer;
use crate::research::AgentState;
use crate::tools::handoff::{handoff_to_planner, HANDOFF_TO_PLANNER};
use crate::types::{AgentOutput, AppError, ConversationMessage, Node, Result};
use crate::utils::cancel::cancellable;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Entry stage: answers small talk directly or hands the query to the planner.
pub struct CoordinatorAgent {
    llm: Arc<dyn LLMClient>,
    templates: Arc<dyn TemplateRenderer>,
}

impl CoordinatorAgent {
    pub fn new(llm: Arc<dyn LLMClient>, templates: Arc<dyn TemplateRenderer>) -> Self {
        Self { llm, templates }
    }
}

#[async_trait]
impl Agent for CoordinatorAgent {
    async fn execute(
        &self,
        state: &mut AgentState,
        cancel: &CancellationToken,
    ) -> Result<AgentOutput> {
        let system = self
            .templates
            .render("coordinator", &base_vars(&state.locale))?;

        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(ConversationMessage::system(system));
        messages.extend(state.messages.iter().cloned());

        let tools = [handoff_to_planner()];
        let response = cancellable(
            cancel,
            self.llm.generate_with_tools_and_history(&messages, &tools),
        )
        .await?;

        if let Some(call) = response
            .tool_calls
            .iter()
            .find(|call| call.name != HANDOFF_TO_PLANNER)
        {
            return Err(AppError::Protocol(format!(
                "coordinator may only call {}, got '{}'",
                HANDOFF_TO_PLANNER, call.name
            )));
        }

        if response.tool_calls.is_empty() {
            info!("Coordinator answered directly");
            Ok(AgentOutput::with_output(Node::End, response.content))
        } else {
            info!("Coordinator handed off to planner");
            Ok(AgentOutput::route(Node::Planner))
        }
    }

    fn node(&self) -> Node {
        Node::Coordinator
    }
}
