//! Agent executor port
//!
//! Defines how the engine hands a task to an agent for actual execution
//! (e.g. a language model call). Implementations live outside the core.

use async_trait::async_trait;
use conclave_domain::{AgentInstance, TaskDefinition};
use thiserror::Error;

/// Errors an executor can report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutorError {
    #[error("Execution failed: {0}")]
    Failed(String),

    #[error("Execution timed out")]
    Timeout,

    #[error("Agent unavailable: {0}")]
    Unavailable(String),
}

/// Performs the work of a task on behalf of an agent
///
/// Executors only report output or failure; the caller wraps the outcome
/// into a [`TaskResult`](conclave_domain::TaskResult) with timings and the
/// agent id.
#[async_trait]
pub trait AgentExecutor: Send + Sync {
    async fn execute(
        &self,
        agent: &AgentInstance,
        task: &TaskDefinition,
    ) -> Result<String, ExecutorError>;
}
