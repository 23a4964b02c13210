//! Workflow stages
//!
//! Each stage reads and mutates the run's [`AgentState`] and names the stage
//! that runs next. The [`WorkflowEngine`](crate::workflows::WorkflowEngine)
//! drives them until one returns [`Node::End`].
//!
//! | Stage | Model call | Next |
//! |-------|------------|------|
//! | [`CoordinatorAgent`] | tools: `handoff_to_planner` | Planner or End |
//! | [`PlannerAgent`] | structured JSON | ResearchTeam or Reporter |
//! | [`ResearchTeamAgent`] | none | Researcher, Coder or Planner |
//! | [`ResearcherAgent`] | tool loop: `web_search`, `crawl` | ResearchTeam |
//! | [`CoderAgent`] | tool loop: `python_executor` | ResearchTeam |
//! | [`ReporterAgent`] | plain | End |

pub mod coder;
pub mod coordinator;
pub mod planner;
pub mod reporter;
pub mod research_team;
pub mod researcher;

pub use coder::CoderAgent;
pub use coordinator::CoordinatorAgent;
pub use planner::PlannerAgent;
pub use reporter::ReporterAgent;
pub use research_team::ResearchTeamAgent;
pub use researcher::ResearcherAgent;

use crate::research::{AgentState, Step};
use crate::types::{AgentOutput, ConversationMessage, Node, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Recorded as a step's result when the model returns nothing, so the step
/// still counts as completed.
pub const NO_FINDINGS: &str = "No findings were produced for this step.";

/// Base trait for all workflow stages
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run the stage against the shared state and pick the next stage.
    async fn execute(
        &self,
        state: &mut AgentState,
        cancel: &CancellationToken,
    ) -> Result<AgentOutput>;

    /// The node this stage implements.
    fn node(&self) -> Node;
}

/// Variables every template receives.
pub(crate) fn base_vars(locale: &str) -> HashMap<&'static str, String> {
    HashMap::from([
        ("current_time", chrono::Utc::now().to_rfc3339()),
        ("locale", locale.to_string()),
    ])
}

/// The user message framing a plan step as a task.
pub(crate) fn task_message(step: &Step) -> ConversationMessage {
    ConversationMessage::user(format!(
        "# Task\n\n## Title\n\n{}\n\n## Description\n\n{}",
        step.title, step.description
    ))
}

/// Write a step result into the plan and the shared history.
pub(crate) fn record_step_result(
    state: &mut AgentState,
    idx: usize,
    result: String,
) -> Result<AgentOutput> {
    let result = if result.trim().is_empty() {
        tracing::warn!(step = idx, "Stage produced no output, recording placeholder");
        NO_FINDINGS.to_string()
    } else {
        result
    };

    state.complete_step(idx, result.clone())?;
    state.push_message(ConversationMessage::user(result.clone()));
    Ok(AgentOutput::with_output(Node::ResearchTeam, result))
}
