use crate::agents::{base_vars, Agent};
use crate::llm::LLMClient;
use crate::prompts::TemplateRenderer;
use crate::research::AgentState;
use crate::types::{AgentOutput, ConversationMessage, Node, Result};
use crate::utils::cancel::cancellable;
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Structure every report must follow, sent after the requirements.
pub const REPORT_STRUCTURE: &str = "IMPORTANT: Structure the report as follows:

1. Key Points: a bulleted list of the most important findings
2. Overview: a short introduction to the topic
3. Detailed Analysis: the findings organised into logical sections
4. Survey Note (optional): a longer, more academic discussion for comprehensive reports
5. Key Citations: every reference, listed at the end

Do not put citations inline. List them only in Key Citations, one per line in the form `- [Source Title](URL)`, with an empty line between entries.

Prefer markdown tables for data, statistics, comparisons and options. Give tables clear headers, for example:

| Feature | Description | Pros | Cons |
|---------|-------------|------|------|
| Feature 1 | Description 1 | Pros 1 | Cons 1 |
| Feature 2 | Description 2 | Pros 2 | Cons 2 |";

/// Writes the final report from the whole conversation.
pub struct ReporterAgent {
    llm: Arc<dyn LLMClient>,
    templates: Arc<dyn TemplateRenderer>,
}

impl ReporterAgent {
    pub fn new(llm: Arc<dyn LLMClient>, templates: Arc<dyn TemplateRenderer>) -> Self {
        Self { llm, templates }
    }

    fn requirements(state: &AgentState) -> String {
        let (task, description) = match &state.current_plan {
            Some(plan) => (plan.title.as_str(), plan.thought.as_str()),
            None => (state.query(), state.query()),
        };
        format!(
            "# Research Requirements\n\n## Task\n\n{}\n\n## Description\n\n{}",
            task, description
        )
    }
}

#[async_trait]
impl Agent for ReporterAgent {
    async fn execute(
        &self,
        state: &mut AgentState,
        cancel: &CancellationToken,
    ) -> Result<AgentOutput> {
        info!("Reporter started");
        let system = self
            .templates
            .render("reporter", &base_vars(&state.locale))?;

        let mut messages = Vec::with_capacity(state.messages.len() + 3);
        messages.push(ConversationMessage::system(system));
        messages.push(ConversationMessage::user(Self::requirements(state)));
        messages.push(ConversationMessage::system(REPORT_STRUCTURE));
        messages.extend(state.messages.iter().cloned());

        let report = cancellable(cancel, self.llm.generate_with_history(&messages)).await?;

        info!(chars = report.len(), "Reporter finished");
        Ok(AgentOutput::with_output(Node::End, report))
    }

    fn node(&self) -> Node {
        Node::Reporter
    }
}
