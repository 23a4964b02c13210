use crate::agents::Agent;
use crate::research::{AgentState, StepType};
use crate::types::{AgentOutput, Node, Result};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Dispatches the first pending step to the stage that handles its type.
pub struct ResearchTeamAgent;

impl ResearchTeamAgent {
    /// Routing decision for the current state.
    pub fn dispatch(state: &AgentState) -> Node {
        let Some((idx, step)) = state.next_pending_step() else {
            return Node::Planner;
        };

        let next = match step.step_type {
            StepType::Research => Node::Researcher,
            StepType::Processing => Node::Coder,
            StepType::Other => Node::Planner,
        };
        info!(step = idx, title = %step.title, agent = %next, "Research team assigned step");
        next
    }
}

#[async_trait]
impl Agent for ResearchTeamAgent {
    async fn execute(
        &self,
        state: &mut AgentState,
        _cancel: &CancellationToken,
    ) -> Result<AgentOutput> {
        Ok(AgentOutput::route(Self::dispatch(state)))
    }

    fn node(&self) -> Node {
        Node::ResearchTeam
    }
}
