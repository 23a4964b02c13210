//! Research plan and the per-run state shared by every stage.

use crate::llm::structured::Validate;
use crate::types::{AppError, ConversationMessage, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What kind of work a plan step needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StepType {
    /// Gather information with search and crawl.
    Research,
    /// Compute or analyse with code execution.
    Processing,
    /// Any unrecognised type; routed back to planning. Not advertised to the model.
    #[serde(other)]
    #[schemars(skip)]
    Other,
}

/// One unit of work in a [`Plan`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Step {
    #[serde(default)]
    pub need_web_search: bool,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub step_type: StepType,
    /// Empty while the step is pending. Never read from model output.
    #[serde(default, skip_deserializing)]
    #[schemars(skip)]
    pub execution_result: String,
}

impl Step {
    pub fn is_pending(&self) -> bool {
        self.execution_result.is_empty()
    }
}

/// A research plan produced by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Plan {
    /// The planner judged the conversation already sufficient for a report.
    #[serde(default)]
    pub has_enough_context: bool,
    #[serde(default)]
    pub thought: String,
    pub title: String,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Validate for Plan {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::Validation("plan title is empty".to_string()));
        }
        if let Some(idx) = self.steps.iter().position(|s| s.title.trim().is_empty()) {
            return Err(AppError::Validation(format!("step {} has an empty title", idx)));
        }
        Ok(())
    }
}

/// JSON schema of [`Plan`], shown to the planner so it knows the expected shape.
pub fn plan_schema() -> String {
    let schema = schemars::schema_for!(Plan);
    serde_json::to_string_pretty(&schema).unwrap_or_default()
}

/// State owned by one research run and threaded through every stage.
#[derive(Debug, Clone)]
pub struct AgentState {
    /// Shared conversation history, append-only.
    pub messages: Vec<ConversationMessage>,
    pub locale: String,
    pub current_plan: Option<Plan>,
    pub last_plan: Option<Plan>,
    /// Successful planner invocations so far.
    pub plan_iterations: usize,
}

impl AgentState {
    /// Fresh state with the user's query as the first message.
    pub fn new(query: impl Into<String>, locale: impl Into<String>) -> Self {
        Self {
            messages: vec![ConversationMessage::user(query)],
            locale: locale.into(),
            current_plan: None,
            last_plan: None,
            plan_iterations: 0,
        }
    }

    /// The original query (first user message).
    pub fn query(&self) -> &str {
        self.messages
            .first()
            .map(|m| m.content.as_str())
            .unwrap_or_default()
    }

    pub fn push_message(&mut self, message: ConversationMessage) {
        self.messages.push(message);
    }

    /// Install a new plan, keeping the superseded one as `last_plan`.
    pub fn install_plan(&mut self, plan: Plan) {
        self.last_plan = self.current_plan.take();
        self.current_plan = Some(plan);
        self.plan_iterations += 1;
    }

    /// The first step of the current plan that has no result yet.
    pub fn next_pending_step(&self) -> Option<(usize, &Step)> {
        self.current_plan
            .as_ref()?
            .steps
            .iter()
            .enumerate()
            .find(|(_, step)| step.is_pending())
    }

    /// Record the result of step `idx`. Completed steps cannot be overwritten.
    pub fn complete_step(&mut self, idx: usize, result: impl Into<String>) -> Result<()> {
        let result = result.into();
        if result.is_empty() {
            return Err(AppError::Internal(format!(
                "step {} cannot be completed with an empty result",
                idx
            )));
        }
        let step = self
            .current_plan
            .as_mut()
            .and_then(|plan| plan.steps.get_mut(idx))
            .ok_or_else(|| AppError::Internal(format!("no step {} in the current plan", idx)))?;
        if !step.is_pending() {
            return Err(AppError::Internal(format!(
                "step {} ('{}') is already completed",
                idx, step.title
            )));
        }
        step.execution_result = result;
        Ok(())
    }

    /// Completed steps of the current plan, in plan order.
    pub fn completed_steps(&self) -> impl Iterator<Item = &Step> {
        self.current_plan
            .iter()
            .flat_map(|plan| plan.steps.iter())
            .filter(|step| !step.is_pending())
    }
}
