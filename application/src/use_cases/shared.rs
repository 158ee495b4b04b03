//! Shared utilities for use cases.
//!
//! Cancellation checks and timed executor calls used by both the council
//! and the orchestrator.

use crate::ports::agent_executor::{AgentExecutor, ExecutorError};
use conclave_domain::{AgentInstance, TaskDefinition};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Marker error: the run's cancellation token fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cancelled;

/// Check if cancellation has been requested.
///
/// Returns `Err(Cancelled)` if the token exists and is cancelled.
pub(crate) fn check_cancelled(token: &Option<CancellationToken>) -> Result<(), Cancelled> {
    if let Some(token) = token
        && token.is_cancelled()
    {
        return Err(Cancelled);
    }
    Ok(())
}

/// Sleep for `delay`, waking early with `Err(Cancelled)` if the token fires.
pub(crate) async fn sleep_cancellable(
    delay: Duration,
    token: &Option<CancellationToken>,
) -> Result<(), Cancelled> {
    match token {
        Some(token) => tokio::select! {
            _ = token.cancelled() => Err(Cancelled),
            _ = tokio::time::sleep(delay) => Ok(()),
        },
        None => {
            tokio::time::sleep(delay).await;
            Ok(())
        }
    }
}

/// Run the executor, mapping an elapsed `timeout` to [`ExecutorError::Timeout`].
pub(crate) async fn execute_with_timeout<E: AgentExecutor + ?Sized>(
    executor: &E,
    agent: &AgentInstance,
    task: &TaskDefinition,
    timeout: Option<Duration>,
) -> Result<String, ExecutorError> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, executor.execute(agent, task))
            .await
            .unwrap_or(Err(ExecutorError::Timeout)),
        None => executor.execute(agent, task).await,
    }
}
