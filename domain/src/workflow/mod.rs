//! Workflow model
//!
//! Static, registered workflows and the per-run state the orchestrator
//! threads through their execution.

pub mod context;
pub mod entities;
pub mod value_objects;

pub use context::{WorkflowContext, step_output_key};
pub use entities::{ErrorPolicy, ExecutionStrategy, StepCondition, Workflow, WorkflowStep};
pub use value_objects::{StepResult, WorkflowError, WorkflowErrorKind, WorkflowReport};
