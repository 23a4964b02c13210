use crate::types::{AppError, Result, ToolDefinition};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// An external capability the model can call by name.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn parameters_schema(&self) -> Value;
    /// Run the capability. The returned text becomes the tool message content.
    async fn execute(&self, args: Value) -> Result<String>;
}

/// Decode a tool's arguments into its typed argument struct.
///
/// Arguments that do not match the declared schema are the model's fault,
/// so they surface as protocol violations rather than capability failures.
pub fn parse_args<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|e| AppError::Protocol(format!("invalid arguments for '{}': {}", tool, e)))
}

/// Name → handler table plus the declarations advertised to the model.
#[derive(Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Builder-style [`ToolRegistry::register`].
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// A registry containing only `names`.
    ///
    /// Fails with a configuration error if any name is not registered, so a
    /// stage cannot be built with a capability the engine does not have.
    pub fn scoped(&self, names: &[&str]) -> Result<ToolRegistry> {
        let mut scoped = ToolRegistry::new();
        for name in names {
            let tool = self.tools.get(*name).ok_or_else(|| {
                AppError::Configuration(format!("Tool '{}' is not registered", name))
            })?;
            scoped.register(Arc::clone(tool));
        }
        Ok(scoped)
    }

    /// Declarations sorted by name, so requests are deterministic.
    pub fn get_tool_definitions(&self) -> Vec<ToolDefinition> {
        let mut definitions: Vec<ToolDefinition> = self
            .tools
            .values()
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect();
        definitions.sort_by(|a, b| a.name.cmp(&b.name));
        definitions
    }

    pub async fn execute(&self, name: &str, args: Value) -> Result<String> {
        if let Some(tool) = self.tools.get(name) {
            tool.execute(args).await
        } else {
            Err(AppError::Protocol(format!("Tool not found: {}", name)))
        }
    }

    /// Get a list of all registered tool names, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if a tool is registered
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
