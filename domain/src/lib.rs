//! Domain layer for conclave
//!
//! Pure types and functions of the orchestration engine. No async runtime,
//! no I/O.
//!
//! # Core Concepts
//!
//! - **Agent**: a pooled worker with a role, capabilities and running stats
//! - **Decomposition**: expanding a task into dependency-ordered sub-tasks
//! - **Ranking**: peer scores of candidate answers and the consensus they imply
//! - **Synthesis**: combining candidates according to the consensus level
//! - **Council**: respond, rank, synthesize
//! - **Workflow**: registered steps executed in dependency batches

pub mod agent;
pub mod core;
pub mod council;
pub mod decomposition;
pub mod event;
pub mod ranking;
pub mod synthesis;
pub mod task;
pub mod workflow;

// Re-export commonly used types
pub use agent::{
    AgentDefinition, AgentInstance, AgentRole, AgentStats, AgentStatus, LoadBalancingStrategy,
    PoolStats, match_score,
};
pub use core::error::DomainError;
pub use council::{ChairmanSynthesis, CouncilResult, CouncilStage, MemberRanking, MemberResponse};
pub use decomposition::{DecompositionResult, TaskDecomposer, calculate_complexity};
pub use event::OrchestrationEvent;
pub use ranking::{ConflictEntry, ConflictSeverity, ConsensusLevel, RankingEntry};
pub use synthesis::{SynthesisAnswer, SynthesisCandidate, SynthesisStrategy, select_strategy};
pub use task::{ExecutionStatus, Priority, SubTask, TaskDefinition, TaskOutcome, TaskResult};
pub use workflow::{
    ErrorPolicy, ExecutionStrategy, StepResult, Workflow, WorkflowContext, WorkflowError,
    WorkflowErrorKind, WorkflowReport, WorkflowStep,
};
