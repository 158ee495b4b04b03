//! Workflow value objects: step results, errors and the run report.

use crate::task::{ExecutionStatus, TaskResult, elapsed_ms};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Outcome of one workflow step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    pub step_id: String,
    /// Agents that ran the step (several for parallel steps)
    pub agent_ids: Vec<String>,
    pub status: ExecutionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub attempts: u32,
    /// Resolved step params
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    /// Per-agent results of a parallel step
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub runs: Vec<TaskResult>,
}

impl StepResult {
    fn finished(
        step_id: impl Into<String>,
        agent_ids: Vec<String>,
        status: ExecutionStatus,
        started_at: DateTime<Utc>,
    ) -> Self {
        let completed_at = Utc::now();
        Self {
            step_id: step_id.into(),
            agent_ids,
            status,
            output: None,
            error: None,
            duration_ms: elapsed_ms(started_at, completed_at),
            started_at,
            completed_at,
            attempts: 1,
            params: BTreeMap::new(),
            runs: Vec::new(),
        }
    }

    pub fn completed(
        step_id: impl Into<String>,
        agent_ids: Vec<String>,
        output: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut result = Self::finished(step_id, agent_ids, ExecutionStatus::Completed, started_at);
        result.output = Some(output.into());
        result
    }

    pub fn failed(
        step_id: impl Into<String>,
        agent_ids: Vec<String>,
        error: impl Into<String>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut result = Self::finished(step_id, agent_ids, ExecutionStatus::Failed, started_at);
        result.error = Some(error.into());
        result
    }

    /// A step whose condition did not hold. Never ran, zero attempts.
    pub fn skipped(step_id: impl Into<String>) -> Self {
        let mut result = Self::finished(step_id, Vec::new(), ExecutionStatus::Skipped, Utc::now());
        result.attempts = 0;
        result
    }

    /// Result of a step run by a single agent.
    pub fn from_task(step_id: impl Into<String>, task: TaskResult) -> Self {
        Self {
            step_id: step_id.into(),
            agent_ids: task.agent_id.iter().cloned().collect(),
            status: task.status,
            output: task.output,
            error: task.error,
            duration_ms: task.duration_ms,
            started_at: task.started_at,
            completed_at: task.completed_at,
            attempts: task.attempts,
            params: BTreeMap::new(),
            runs: Vec::new(),
        }
    }

    /// Result of a parallel step: completed when at least one run
    /// completed. Outputs of completed runs are joined in run order.
    pub fn from_runs(step_id: impl Into<String>, runs: Vec<TaskResult>, started_at: DateTime<Utc>) -> Self {
        let agent_ids = runs.iter().filter_map(|r| r.agent_id.clone()).collect();
        let outputs: Vec<&str> = runs
            .iter()
            .filter(|r| r.is_completed())
            .filter_map(|r| r.output.as_deref())
            .collect();

        let mut result = if outputs.is_empty() {
            let errors: Vec<&str> = runs.iter().filter_map(|r| r.error.as_deref()).collect();
            let error = if errors.is_empty() {
                "no agent ran the step".to_string()
            } else {
                errors.join("; ")
            };
            Self::failed(step_id, agent_ids, error, started_at)
        } else {
            Self::completed(step_id, agent_ids, outputs.join("\n\n"), started_at)
        };

        result.attempts = runs.iter().map(|r| r.attempts).max().unwrap_or(0);
        result.runs = runs;
        result
    }

    pub fn with_params(mut self, params: BTreeMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn is_completed(&self) -> bool {
        self.status.is_completed()
    }

    pub fn is_failed(&self) -> bool {
        self.status.is_failed()
    }

    /// Completed or skipped: dependants may proceed.
    pub fn is_settled_ok(&self) -> bool {
        !self.is_failed()
    }
}

/// Category of a workflow error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowErrorKind {
    /// A step failed to execute
    Execution,
    /// Cycle or unknown dependency; the step was never scheduled
    Structural,
    /// The run was cancelled
    Cancelled,
}

impl WorkflowErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowErrorKind::Execution => "execution",
            WorkflowErrorKind::Structural => "structural",
            WorkflowErrorKind::Cancelled => "cancelled",
        }
    }
}

/// Error recorded during a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowError {
    pub step_id: Option<String>,
    pub kind: WorkflowErrorKind,
    pub message: String,
}

impl WorkflowError {
    pub fn execution(step_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step_id: Some(step_id.into()),
            kind: WorkflowErrorKind::Execution,
            message: message.into(),
        }
    }

    pub fn structural(step_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            step_id: Some(step_id.into()),
            kind: WorkflowErrorKind::Structural,
            message: message.into(),
        }
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self {
            step_id: None,
            kind: WorkflowErrorKind::Cancelled,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.step_id {
            Some(step) => write!(f, "[{}] {}: {}", self.kind.as_str(), step, self.message),
            None => write!(f, "[{}] {}", self.kind.as_str(), self.message),
        }
    }
}

/// Everything a workflow run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowReport {
    pub workflow_id: String,
    /// Step results in the order they settled (batch by batch)
    pub results: Vec<StepResult>,
    pub errors: Vec<WorkflowError>,
    /// Steps never scheduled because of cycles or unknown dependencies
    pub unresolved: Vec<String>,
    /// Number of steps the workflow declared
    pub total_steps: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
}

impl WorkflowReport {
    /// No errors, nothing cancelled, and every declared step completed or
    /// was skipped.
    pub fn success(&self) -> bool {
        !self.cancelled
            && self.errors.is_empty()
            && self.unresolved.is_empty()
            && self.results.len() == self.total_steps
            && self.results.iter().all(StepResult::is_settled_ok)
    }

    pub fn result(&self, step_id: &str) -> Option<&StepResult> {
        self.results.iter().find(|r| r.step_id == step_id)
    }

    pub fn completed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_completed()).count()
    }

    pub fn failed_steps(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| r.is_failed())
            .map(|r| r.step_id.as_str())
            .collect()
    }
}
