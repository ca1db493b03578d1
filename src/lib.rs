//! A task-pipeline library for running lead-generation agent crews.
//!
//! Define role-bound agents, wire them into an ordered task chain, and let
//! the runner execute them. Each task's instruction template is rendered
//! against the run's input variables plus its upstream tasks' outputs, so
//! research flows into reporting without any shared mutable state. The
//! bundled crew ([`crew::lead_pipeline`]) pairs a researcher (backed by a
//! scraping tool) with a reporting analyst and persists the final report
//! as a timestamped markdown artifact.
//!
//! # Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use leadgen::{
//!     Agent, CompletionModel, CompletionRequest, ExecutionContext, Inputs, Memory,
//!     ModelError, Pipeline, Runner, Task,
//! };
//!
//! struct CannedModel;
//! impl CompletionModel for CannedModel {
//!     fn complete(&self, _request: &CompletionRequest) -> Result<String, ModelError> {
//!         Ok("two promising leads".to_string())
//!     }
//! }
//!
//! let pipeline = Pipeline::builder("demo")
//!     .agent(Agent::new("researcher", "You research leads.", Arc::new(CannedModel)))
//!     .task(Task::new("research", "researcher", "Find leads about {topic}."))
//!     .build()
//!     .unwrap();
//!
//! let inputs = ExecutionContext::new(Inputs {
//!     topic: "AI Agents".into(),
//!     role: "AI Agent Development".into(),
//!     location: "Remote".into(),
//!     budget_min: 1000,
//!     max_results: 50,
//! });
//!
//! let mut memory = Memory::new();
//! let run = Runner::new(pipeline).kickoff(&inputs, &mut memory).unwrap();
//! assert_eq!(run.final_output(), Some("two promising leads"));
//! ```

mod agent;
mod config;
mod context;
pub mod crew;
mod memory;
mod model;
mod pipeline;
mod runner;
mod task;
pub mod tools;

pub use agent::{Agent, AgentError, OnEmptyData, ToolPolicy};
pub use config::ConfigError;
pub use context::{ExecutionContext, Inputs, REQUIRED_VARS};
pub use memory::Memory;
pub use model::{
    CompletionModel, CompletionRequest, DEFAULT_MODEL, GroqClient, ModelConfig, ModelError,
};
pub use pipeline::{Pipeline, PipelineBuilder, PipelineError};
pub use runner::{ErrorEvent, PipelineRun, RunError, RunStatus, Runner, TaskEvent};
pub use task::{RenderError, Task, TaskContext, TaskResult, TaskState};
