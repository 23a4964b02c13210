//! The coordinator's planning handoff.
//!
//! `handoff_to_planner` is declared to the model but never dispatched: the
//! coordinator treats a call to it as the signal to start planning.

use crate::types::ToolDefinition;
use serde_json::json;

pub const HANDOFF_TO_PLANNER: &str = "handoff_to_planner";

pub fn handoff_to_planner() -> ToolDefinition {
    ToolDefinition {
        name: HANDOFF_TO_PLANNER.to_string(),
        description: "Hand off to the planner agent to do research planning.".to_string(),
        parameters: json!({
            "type": "object",
            "properties": {}
        }),
    }
}
