//! Task domain module
//!
//! Task descriptors submitted by callers, the sub-tasks produced by
//! decomposition, and the immutable results of executing them.

pub mod entities;
pub mod value_objects;

pub use entities::{Priority, SubTask, TaskDefinition};
pub use value_objects::{ExecutionStatus, TaskOutcome, TaskResult, elapsed_ms};
