//! Research plan data model
//!
//! A run is driven by a [`Plan`] of [`Step`]s produced by the planner stage.
//! Research and processing stages fill in each step's result in order; the
//! reporter then writes the final report from the accumulated history.
//!
//! All of it lives in an [`AgentState`] owned by the run.

pub mod state;

pub use state::{plan_schema, AgentState, Plan, Step, StepType};
