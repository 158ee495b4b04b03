//! Application layer for conclave
//!
//! This crate contains use cases, port definitions, and application configuration.
//! It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::{CouncilConfig, OrchestratorConfig, PoolConfig};
pub use ports::{
    agent_executor::{AgentExecutor, ExecutorError},
    event_observer::{ChannelObserver, CompositeObserver, EventObserver, NoObserver},
};
pub use use_cases::agent_pool::{AgentPool, PoolError};
pub use use_cases::orchestrator::{Orchestrator, OrchestratorError};
pub use use_cases::run_council::{CouncilError, CouncilUseCase};
