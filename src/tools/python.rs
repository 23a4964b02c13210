//! Python code execution capability

use crate::tools::registry::{parse_args, Tool};
use crate::types::{AppError, Result};
use crate::utils::config::CodeConfig;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::process::Command;

#[derive(Debug, Deserialize)]
struct PythonArgs {
    code: String,
}

/// Runs a Python snippet with `python -c` and returns its stdout.
///
/// The child is killed if the call is dropped (timeout or cancellation).
pub struct PythonExecutorTool {
    python_bin: String,
}

impl PythonExecutorTool {
    pub fn new(python_bin: impl Into<String>) -> Self {
        Self {
            python_bin: python_bin.into(),
        }
    }

    pub fn from_config(config: &CodeConfig) -> Self {
        Self::new(config.python_bin.clone())
    }
}

#[async_trait]
impl Tool for PythonExecutorTool {
    fn name(&self) -> &str {
        "python_executor"
    }

    fn description(&self) -> &str {
        "Execute python code for data analysis or calculation. Print any value you want to see with `print(...)`."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The python code to execute"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String> {
        let args: PythonArgs = parse_args(self.name(), args)?;

        tracing::debug!(code = %args.code, "Executing python");

        let output = Command::new(&self.python_bin)
            .arg("-c")
            .arg(&args.code)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| {
                AppError::tool(
                    "python_executor",
                    format!("failed to start {}: {}", self.python_bin, e),
                )
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(status = %output.status, "Python execution failed");
            return Err(AppError::tool(
                "python_executor",
                format!("exited with {}: {}", output.status, stderr.trim()),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
