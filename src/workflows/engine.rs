//! Workflow Engine
//!
//! Runs one research query through the stage graph. The engine starts at the
//! coordinator, invokes whichever stage the previous one named, and stops at
//! [`Node::End`], whose output is the run's result.

use crate::agents::{
    Agent, CoderAgent, CoordinatorAgent, PlannerAgent, ReporterAgent, ResearchTeamAgent,
    ResearcherAgent,
};
use crate::llm::{LLMClient, OpenAIClient, ToolCallingConfig};
use crate::prompts::{PromptTemplates, TemplateRenderer};
use crate::research::AgentState;
use crate::tools::{self, ToolRegistry};
use crate::types::{AppError, Node, Result};
use crate::utils::config::{ResearchConfig, WorkflowConfig};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// Output from a workflow execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutput {
    /// The final response from the workflow
    pub final_response: String,
    /// Number of stage invocations
    pub steps_executed: usize,
    /// Stages that ran, in first-use order
    pub agents_used: Vec<String>,
    /// Successful planner invocations
    pub plan_iterations: usize,
    /// Detailed path showing each stage invocation
    pub reasoning_path: Vec<WorkflowStep>,
}

/// A single stage invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// The stage that ran
    pub agent: Node,
    /// The output it produced (often empty for routing stages)
    pub output: String,
    /// Unix timestamp when this step started
    pub timestamp: i64,
    /// Duration of this step in milliseconds
    pub duration_ms: u64,
}

/// One run's stage instances.
struct Stages {
    coordinator: CoordinatorAgent,
    planner: PlannerAgent,
    research_team: ResearchTeamAgent,
    researcher: ResearcherAgent,
    coder: CoderAgent,
    reporter: ReporterAgent,
}

impl Stages {
    fn get(&self, node: Node) -> Option<&dyn Agent> {
        match node {
            Node::Coordinator => Some(&self.coordinator),
            Node::Planner => Some(&self.planner),
            Node::ResearchTeam => Some(&self.research_team),
            Node::Researcher => Some(&self.researcher),
            Node::Coder => Some(&self.coder),
            Node::Reporter => Some(&self.reporter),
            Node::End => None,
        }
    }
}

/// Research workflow engine. Cheap to share; each run owns its own state.
pub struct WorkflowEngine {
    llm: Arc<dyn LLMClient>,
    templates: Arc<dyn TemplateRenderer>,
    tools: ToolRegistry,
    config: WorkflowConfig,
}

impl WorkflowEngine {
    /// Create an engine. Fails if the registry lacks a capability a stage needs
    /// or the limits are unusable.
    pub fn new(
        llm: Arc<dyn LLMClient>,
        templates: Arc<dyn TemplateRenderer>,
        tools: ToolRegistry,
        config: WorkflowConfig,
    ) -> Result<Self> {
        if config.structured_max_attempts == 0
            || config.max_tool_iterations == 0
            || config.max_step_num == 0
        {
            return Err(AppError::Configuration(
                "workflow attempts, tool iterations and step count must be at least 1".to_string(),
            ));
        }

        let engine = Self {
            llm,
            templates,
            tools,
            config,
        };
        // Surface missing capabilities now rather than mid-run.
        engine.build_stages()?;
        Ok(engine)
    }

    /// Engine wired to the OpenAI-compatible client, built-in tools and templates.
    pub fn from_config(config: &ResearchConfig) -> Result<Self> {
        let llm: Arc<dyn LLMClient> = Arc::new(OpenAIClient::from_config(&config.llm)?);
        let templates: Arc<dyn TemplateRenderer> = match &config.prompts.dir {
            Some(dir) => Arc::new(PromptTemplates::with_override_dir(dir)),
            None => Arc::new(PromptTemplates::new()),
        };
        let tools = tools::default_registry(config)?;

        Self::new(llm, templates, tools, config.workflow.clone())
    }

    fn tool_calling_config(&self) -> ToolCallingConfig {
        ToolCallingConfig {
            max_iterations: self.config.max_tool_iterations,
            tool_timeout: self.config.tool_timeout(),
            recover_tool_errors: self.config.recover_tool_errors,
        }
    }

    fn build_stages(&self) -> Result<Stages> {
        let tool_config = self.tool_calling_config();
        Ok(Stages {
            coordinator: CoordinatorAgent::new(self.llm.clone(), self.templates.clone()),
            planner: PlannerAgent::new(
                self.llm.clone(),
                self.templates.clone(),
                self.config.max_plan_iterations,
                self.config.max_step_num,
                self.config.structured_max_attempts,
            ),
            research_team: ResearchTeamAgent,
            researcher: ResearcherAgent::new(
                self.llm.clone(),
                self.templates.clone(),
                &self.tools,
                tool_config.clone(),
            )?,
            coder: CoderAgent::new(
                self.llm.clone(),
                self.templates.clone(),
                &self.tools,
                tool_config,
            )?,
            reporter: ReporterAgent::new(self.llm.clone(), self.templates.clone()),
        })
    }

    /// Run `query` to completion and return the final text.
    pub async fn research(&self, query: &str) -> Result<String> {
        Ok(self
            .run(query, &CancellationToken::new())
            .await?
            .final_response)
    }

    /// Run `query` in the configured locale, returning the full trace.
    pub async fn run(&self, query: &str, cancel: &CancellationToken) -> Result<WorkflowOutput> {
        self.run_in_locale(query, &self.config.locale, cancel).await
    }

    /// Run `query` with an explicit locale.
    pub async fn run_in_locale(
        &self,
        query: &str,
        locale: &str,
        cancel: &CancellationToken,
    ) -> Result<WorkflowOutput> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("query must not be empty".to_string()));
        }

        let stages = self.build_stages()?;
        let mut state = AgentState::new(query, locale);
        let mut steps: Vec<WorkflowStep> = Vec::new();
        let mut agents_used: Vec<String> = Vec::new();
        let mut node = Node::Coordinator;

        info!(model = %self.llm.model_name(), locale, "Research run started");

        loop {
            if cancel.is_cancelled() {
                return Err(AppError::Cancelled);
            }

            let agent = stages
                .get(node)
                .ok_or_else(|| AppError::Internal(format!("no stage for node {}", node)))?;
            debug_assert_eq!(agent.node(), node);

            let step_start = Instant::now();
            let timestamp = Utc::now().timestamp();

            let output = match agent.execute(&mut state, cancel).await {
                Ok(output) => output,
                Err(e) => {
                    error!(stage = %node, error = %e, "Research run failed");
                    return Err(e);
                }
            };

            steps.push(WorkflowStep {
                agent: node,
                output: output.output.clone(),
                timestamp,
                duration_ms: step_start.elapsed().as_millis() as u64,
            });
            if !agents_used.iter().any(|a| a == node.as_str()) {
                agents_used.push(node.as_str().to_string());
            }

            info!(from = %node, to = %output.next, "Stage transition");

            if output.next.is_terminal() {
                info!(
                    steps = steps.len(),
                    plan_iterations = state.plan_iterations,
                    "Research run finished"
                );
                return Ok(WorkflowOutput {
                    final_response: output.output,
                    steps_executed: steps.len(),
                    agents_used,
                    plan_iterations: state.plan_iterations,
                    reasoning_path: steps,
                });
            }
            node = output.next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::testing::StaticTool;
    use crate::llm::mock::ScriptedLLM;
    use crate::llm::LLMResponse;
    use crate::types::ToolCall;
    use std::time::Duration;

    fn registry() -> ToolRegistry {
        ToolRegistry::new()
            .with_tool(Arc::new(StaticTool::new("web_search", "[]")))
            .with_tool(Arc::new(StaticTool::new("crawl", "page")))
            .with_tool(Arc::new(StaticTool::new("python_executor", "42")))
    }

    fn engine(llm: Arc<ScriptedLLM>) -> WorkflowEngine {
        WorkflowEngine::new(
            llm,
            Arc::new(PromptTemplates::new()),
            registry(),
            WorkflowConfig::default(),
        )
        .unwrap()
    }

    fn handoff() -> LLMResponse {
        LLMResponse::tool_calls(vec![ToolCall {
            id: "h".to_string(),
            name: "handoff_to_planner".to_string(),
            arguments: "{}".to_string(),
        }])
    }

    #[test]
    fn test_engine_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<WorkflowEngine>();
    }

    #[test]
    fn test_missing_capability_fails_at_construction() {
        let tools = ToolRegistry::new().with_tool(Arc::new(StaticTool::new("crawl", "")));
        let result = WorkflowEngine::new(
            Arc::new(ScriptedLLM::texts(&[])),
            Arc::new(PromptTemplates::new()),
            tools,
            WorkflowConfig::default(),
        );
        assert!(matches!(result, Err(AppError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let llm = Arc::new(ScriptedLLM::texts(&["Hello!"]));
        let output = engine(llm)
            .run("hi", &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(output.final_response, "Hello!");
        assert_eq!(output.steps_executed, 1);
        assert_eq!(output.agents_used, vec!["coordinator"]);
        assert_eq!(output.plan_iterations, 0);
    }

    #[tokio::test]
    async fn test_enough_context_goes_straight_to_report() {
        let llm = Arc::new(ScriptedLLM::new(vec![
            Ok(handoff()),
            Ok(LLMResponse::text(
                r#"{"has_enough_context": true, "thought": "t", "title": "T", "steps": []}"#,
            )),
            Ok(LLMResponse::text("final report")),
        ]));

        let output = engine(llm).run("q", &CancellationToken::new()).await.unwrap();
        assert_eq!(output.final_response, "final report");
        let path: Vec<Node> = output.reasoning_path.iter().map(|s| s.agent).collect();
        assert_eq!(path, vec![Node::Coordinator, Node::Planner, Node::Reporter]);
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let llm = Arc::new(ScriptedLLM::texts(&[]));
        let err = engine(llm.clone()).research("   ").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_failure_yields_no_report() {
        let llm = Arc::new(ScriptedLLM::new(vec![
            Ok(handoff()),
            Err(AppError::LLM("a".into())),
            Err(AppError::LLM("b".into())),
            Err(AppError::LLM("c".into())),
        ]));
        let err = engine(llm).research("q").await.unwrap_err();
        assert!(matches!(err, AppError::GenerateJson { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_cancellation_stops_run() {
        let llm = Arc::new(ScriptedLLM::texts(&["late"]).with_delay(Duration::from_secs(30)));
        let engine = engine(llm);
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let err = engine.run("q", &token).await.unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
    }
}
