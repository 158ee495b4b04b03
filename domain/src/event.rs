//! Orchestration events
//!
//! Emitted by the pool, the council and the orchestrator so observers can
//! follow a run. Serialized with a `type` field such as `"step:completed"`.

use crate::agent::AgentRole;
use crate::council::CouncilStage;
use crate::ranking::ConsensusLevel;
use crate::synthesis::SynthesisStrategy;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OrchestrationEvent {
    #[serde(rename = "agent:registered")]
    AgentRegistered { agent_id: String, role: AgentRole },

    #[serde(rename = "agent:acquired")]
    AgentAcquired {
        agent_id: String,
        task_id: Option<String>,
    },

    #[serde(rename = "agent:released")]
    AgentReleased {
        agent_id: String,
        /// `None` when released without an outcome
        success: Option<bool>,
    },

    #[serde(rename = "workflow:started")]
    WorkflowStarted {
        workflow_id: String,
        steps: usize,
        batches: usize,
    },

    #[serde(rename = "batch:started")]
    BatchStarted {
        workflow_id: String,
        batch: usize,
        steps: Vec<String>,
    },

    #[serde(rename = "step:started")]
    StepStarted { workflow_id: String, step_id: String },

    #[serde(rename = "step:completed")]
    StepCompleted {
        workflow_id: String,
        step_id: String,
        agent_ids: Vec<String>,
        duration_ms: u64,
        attempts: u32,
    },

    #[serde(rename = "step:failed")]
    StepFailed {
        workflow_id: String,
        step_id: String,
        error: String,
        attempts: u32,
    },

    #[serde(rename = "step:skipped")]
    StepSkipped { workflow_id: String, step_id: String },

    #[serde(rename = "task:retry")]
    TaskRetry {
        task_id: String,
        /// The attempt about to start (2 = first retry)
        attempt: u32,
        error: String,
    },

    /// Some steps or sub-tasks have cyclic or unknown dependencies
    #[serde(rename = "decomposition:stalled")]
    DecompositionStalled {
        workflow_id: String,
        unresolved: Vec<String>,
    },

    #[serde(rename = "workflow:completed")]
    WorkflowCompleted {
        workflow_id: String,
        success: bool,
        completed: usize,
        failed: usize,
        cancelled: bool,
        duration_ms: u64,
    },

    #[serde(rename = "council:stage_started")]
    CouncilStageStarted {
        task_id: String,
        stage: CouncilStage,
        members: usize,
    },

    #[serde(rename = "council:stage_completed")]
    CouncilStageCompleted {
        task_id: String,
        stage: CouncilStage,
        succeeded: usize,
        failed: usize,
    },

    #[serde(rename = "council:completed")]
    CouncilCompleted {
        task_id: String,
        consensus: ConsensusLevel,
        strategy: SynthesisStrategy,
        chairman_id: String,
        fallback: bool,
    },
}

impl OrchestrationEvent {
    /// The serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            OrchestrationEvent::AgentRegistered { .. } => "agent:registered",
            OrchestrationEvent::AgentAcquired { .. } => "agent:acquired",
            OrchestrationEvent::AgentReleased { .. } => "agent:released",
            OrchestrationEvent::WorkflowStarted { .. } => "workflow:started",
            OrchestrationEvent::BatchStarted { .. } => "batch:started",
            OrchestrationEvent::StepStarted { .. } => "step:started",
            OrchestrationEvent::StepCompleted { .. } => "step:completed",
            OrchestrationEvent::StepFailed { .. } => "step:failed",
            OrchestrationEvent::StepSkipped { .. } => "step:skipped",
            OrchestrationEvent::TaskRetry { .. } => "task:retry",
            OrchestrationEvent::DecompositionStalled { .. } => "decomposition:stalled",
            OrchestrationEvent::WorkflowCompleted { .. } => "workflow:completed",
            OrchestrationEvent::CouncilStageStarted { .. } => "council:stage_started",
            OrchestrationEvent::CouncilStageCompleted { .. } => "council:stage_completed",
            OrchestrationEvent::CouncilCompleted { .. } => "council:completed",
        }
    }

    /// Event fields without the `type` tag
    pub fn payload(&self) -> Value {
        match serde_json::to_value(self) {
            Ok(Value::Object(mut map)) => {
                map.remove("type");
                Value::Object(map)
            }
            Ok(other) => other,
            Err(_) => Value::Null,
        }
    }
}
