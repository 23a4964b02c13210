//! Workflow Engine Module
//!
//! Drives a research run through the stage graph:
//!
//! ```text
//! coordinator ──► planner ──► research_team ──► researcher ─┐
//!      │             ▲  │          │    ▲                    │
//!      │             │  │          │    └──── coder ◄────────┤
//!      │             └──┼──────────┘         (per step)      │
//!      ▼                ▼                                    │
//!   __end__ ◄──────  reporter ◄──────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let engine = WorkflowEngine::from_config(&config)?;
//! let output = engine.run("How fast is the Rust compiler getting?", &cancel).await?;
//! println!("{}", output.final_response);
//! ```

pub mod engine;

pub use engine::{WorkflowEngine, WorkflowOutput, WorkflowStep};
