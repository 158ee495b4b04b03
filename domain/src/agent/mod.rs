//! Agent domain module
//!
//! Worker descriptors, their pooled runtime state, and the pure
//! selection policies the agent pool applies to them.

pub mod entities;
pub mod load_balancing;
pub mod pool_stats;

pub use entities::{AgentDefinition, AgentInstance, AgentRole, AgentStats, AgentStatus};
pub use load_balancing::{LoadBalancingStrategy, match_score, select_agent};
pub use pool_stats::{PerformerSummary, PoolStats};
