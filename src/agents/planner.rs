use crate::agents::{base_vars, Agent};
use crate::llm::structured::generate_structured;
use crate::llm::LLMClient;
use crate::prompts::TemplateRenderer;
use crate::research::{plan_schema, AgentState, Plan};
use crate::types::{AgentOutput, AppError, ConversationMessage, Node, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Produces (or revises) the research plan.
pub struct PlannerAgent {
    llm: Arc<dyn LLMClient>,
    templates: Arc<dyn TemplateRenderer>,
    max_plan_iterations: usize,
    max_step_num: usize,
    max_attempts: usize,
}

impl PlannerAgent {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        templates: Arc<dyn TemplateRenderer>,
        max_plan_iterations: usize,
        max_step_num: usize,
        max_attempts: usize,
    ) -> Self {
        Self {
            llm,
            templates,
            max_plan_iterations,
            max_step_num,
            max_attempts,
        }
    }
}

#[async_trait]
impl Agent for PlannerAgent {
    async fn execute(
        &self,
        state: &mut AgentState,
        cancel: &CancellationToken,
    ) -> Result<AgentOutput> {
        if state.plan_iterations >= self.max_plan_iterations {
            info!(
                iterations = state.plan_iterations,
                "Plan iteration limit reached, moving to reporter"
            );
            return Ok(AgentOutput::route(Node::Reporter));
        }

        let mut vars = base_vars(&state.locale);
        vars.insert("max_step_num", self.max_step_num.to_string());
        vars.insert("plan_schema", plan_schema());
        let system = self.templates.render("planner", &vars)?;

        let mut messages = Vec::with_capacity(state.messages.len() + 1);
        messages.push(ConversationMessage::system(system));
        messages.extend(state.messages.iter().cloned());

        let structured =
            generate_structured::<Plan>(self.llm.as_ref(), &messages, self.max_attempts, cancel)
                .await?;
        let mut plan = structured.value;
        let mut raw = structured.raw;

        if plan.steps.len() > self.max_step_num {
            warn!(
                steps = plan.steps.len(),
                max = self.max_step_num,
                "Plan has too many steps, truncating"
            );
            plan.steps.truncate(self.max_step_num);
            // History must match the plan that actually runs.
            raw = serde_json::to_string(&plan)
                .map_err(|e| AppError::Internal(format!("Failed to encode plan: {}", e)))?;
        }

        let next = if plan.has_enough_context {
            Node::Reporter
        } else {
            Node::ResearchTeam
        };
        info!(title = %plan.title, steps = plan.steps.len(), next = %next, "Plan ready");

        state.push_message(ConversationMessage::assistant(raw, Vec::new()));
        state.install_plan(plan);

        Ok(AgentOutput::route(next))
    }

    fn node(&self) -> Node {
        Node::Planner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::mock::ScriptedLLM;
    use crate::prompts::PromptTemplates;
    use crate::research::StepType;
    use crate::types::MessageRole;

    const PLAN: &str = r#"{
        "has_enough_context": false,
        "thought": "Need GDP figures",
        "title": "France vs Spain GDP",
        "steps": [
            {"need_web_search": true, "title": "Find GDP", "description": "Latest GDP", "step_type": "research"},
            {"need_web_search": false, "title": "Compare", "description": "Ratio", "step_type": "processing"}
        ]
    }"#;

    fn planner(llm: Arc<ScriptedLLM>, max_step_num: usize) -> PlannerAgent {
        PlannerAgent::new(llm, Arc::new(PromptTemplates::new()), 3, max_step_num, 3)
    }

    #[tokio::test]
    async fn test_plan_installed_and_routes_to_research_team() {
        let llm = Arc::new(ScriptedLLM::texts(&[PLAN]));
        let mut state = AgentState::new("Compare GDP", "en-US");

        let out = planner(llm.clone(), 3)
            .execute(&mut state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out, AgentOutput::route(Node::ResearchTeam));
        assert_eq!(state.plan_iterations, 1);
        let plan = state.current_plan.as_ref().unwrap();
        assert_eq!(plan.steps.len(), 2);
        assert_eq!(plan.steps[1].step_type, StepType::Processing);

        let last = state.messages.last().unwrap();
        assert_eq!(last.role, MessageRole::Assistant);
        assert!(last.content.contains("France vs Spain GDP"));

        let request = &llm.requests()[0];
        assert!(request.json_mode);
        assert!(request.messages[0].content.contains("has_enough_context"));
    }

    #[tokio::test]
    async fn test_enough_context_routes_to_reporter() {
        let llm = Arc::new(ScriptedLLM::texts(&[
            r#"{"has_enough_context": true, "thought": "known", "title": "Answer", "steps": []}"#,
        ]));
        let mut state = AgentState::new("q", "en-US");

        let out = planner(llm, 3)
            .execute(&mut state, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(out.next, Node::Reporter);
    }

    #[tokio::test]
    async fn test_iteration_ceiling_skips_model() {
        let llm = Arc::new(ScriptedLLM::texts(&[PLAN]));
        let mut state = AgentState::new("q", "en-US");
        state.plan_iterations = 3;

        let out = planner(llm.clone(), 3)
            .execute(&mut state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(out, AgentOutput::route(Node::Reporter));
        assert_eq!(llm.call_count(), 0);
        assert_eq!(state.plan_iterations, 3);
    }

    #[tokio::test]
    async fn test_previous_plan_is_kept() {
        let llm = Arc::new(ScriptedLLM::texts(&[PLAN, PLAN]));
        let agent = planner(llm, 3);
        let mut state = AgentState::new("q", "en-US");

        agent.execute(&mut state, &CancellationToken::new()).await.unwrap();
        agent.execute(&mut state, &CancellationToken::new()).await.unwrap();

        assert_eq!(state.plan_iterations, 2);
        assert!(state.last_plan.is_some());
    }

    #[tokio::test]
    async fn test_steps_truncated_to_limit() {
        let llm = Arc::new(ScriptedLLM::texts(&[PLAN]));
        let mut state = AgentState::new("q", "en-US");

        planner(llm, 1)
            .execute(&mut state, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(state.current_plan.unwrap().steps.len(), 1);
    }

    #[tokio::test]
    async fn test_truncated_plan_is_what_history_records() {
        let llm = Arc::new(ScriptedLLM::texts(&[PLAN]));
        let mut state = AgentState::new("q", "en-US");

        planner(llm, 1)
            .execute(&mut state, &CancellationToken::new())
            .await
            .unwrap();

        let last = state.messages.last().unwrap();
        assert_eq!(last.role, MessageRole::Assistant);
        assert!(last.content.contains("Find GDP"));
        assert!(!last.content.contains("Compare"));
    }

    #[tokio::test]
    async fn test_step_without_type_is_retried() {
        let llm = Arc::new(ScriptedLLM::texts(&[
            r#"{"title": "GDP", "steps": [{"title": "Find GDP", "description": "France GDP"}]}"#,
            PLAN,
        ]));
        let mut state = AgentState::new("q", "en-US");

        let out = planner(llm.clone(), 3)
            .execute(&mut state, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(llm.call_count(), 2);
        assert_eq!(out, AgentOutput::route(Node::ResearchTeam));
        let plan = state.current_plan.as_ref().unwrap();
        assert_eq!(plan.steps[0].step_type, StepType::Research);
    }

    #[tokio::test]
    async fn test_invalid_output_exhausts_attempts() {
        let llm = Arc::new(ScriptedLLM::texts(&["no", "still no", "{\"title\": \"\"}"]));
        let mut state = AgentState::new("q", "en-US");

        let err = planner(llm.clone(), 3)
            .execute(&mut state, &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::GenerateJson { attempts: 3, .. }));
        assert_eq!(llm.call_count(), 3);
        assert_eq!(state.plan_iterations, 0);
        assert!(state.current_plan.is_none());
    }
}
