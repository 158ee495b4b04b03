//! Task value objects - immutable execution results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Terminal status of a unit of work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStatus {
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Never ran because its condition did not hold
    Skipped,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Skipped => "skipped",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ExecutionStatus::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExecutionStatus::Failed)
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Success flag and duration reported back to the pool on release
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub success: bool,
    pub duration_ms: u64,
}

impl TaskOutcome {
    pub fn new(success: bool, duration_ms: u64) -> Self {
        Self {
            success,
            duration_ms,
        }
    }
}

/// Outcome of executing one task against one agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    /// The task that was executed
    pub task_id: String,
    /// Agent that ran the last attempt (None if no agent could be acquired)
    pub agent_id: Option<String>,
    /// Completed or failed
    pub status: ExecutionStatus,
    /// Executor output on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    /// Error message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Wall-clock duration in milliseconds
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// Number of attempts made (1 unless retried)
    pub attempts: u32,
}

impl TaskResult {
    /// Creates a completed result finishing now.
    pub fn completed(
        task_id: impl Into<String>,
        agent_id: Option<String>,
        output: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let completed_at = Utc::now();
        Self {
            task_id: task_id.into(),
            agent_id,
            status: ExecutionStatus::Completed,
            output: Some(output.into()),
            error: None,
            duration_ms: elapsed_ms(started_at, completed_at),
            started_at,
            completed_at,
            attempts: 1,
        }
    }

    /// Creates a failed result finishing now.
    pub fn failed(
        task_id: impl Into<String>,
        agent_id: Option<String>,
        error: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let completed_at = Utc::now();
        Self {
            task_id: task_id.into(),
            agent_id,
            status: ExecutionStatus::Failed,
            output: None,
            error: Some(error.into()),
            duration_ms: elapsed_ms(started_at, completed_at),
            started_at,
            completed_at,
            attempts: 1,
        }
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    /// The stats update this result implies for the agent that ran it.
    pub fn outcome(&self) -> TaskOutcome {
        TaskOutcome::new(self.is_completed(), self.duration_ms)
    }
}

/// Milliseconds between two instants, clamped at zero.
pub fn elapsed_ms(from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
    (to - from).num_milliseconds().max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completed_result() {
        let started = Utc::now() - chrono::Duration::milliseconds(25);
        let result = TaskResult::completed("t1", Some("agent-a".into()), "done", started);

        assert!(result.is_completed());
        assert_eq!(result.output.as_deref(), Some("done"));
        assert!(result.error.is_none());
        assert!(result.duration_ms >= 25);
        assert_eq!(result.attempts, 1);
        assert!(result.completed_at >= result.started_at);
    }

    #[test]
    fn test_failed_result_outcome() {
        let result = TaskResult::failed("t1", None, "boom", Utc::now()).with_attempts(3);

        assert_eq!(result.status, ExecutionStatus::Failed);
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert_eq!(result.attempts, 3);
        assert!(!result.outcome().success);
    }

    #[test]
    fn test_elapsed_clamps_negative() {
        let now = Utc::now();
        assert_eq!(elapsed_ms(now, now - chrono::Duration::seconds(1)), 0);
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ExecutionStatus::Skipped).unwrap();
        assert_eq!(json, "\"skipped\"");
    }
}
