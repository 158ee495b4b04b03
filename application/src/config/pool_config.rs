//! Agent pool configuration.

use conclave_domain::LoadBalancingStrategy;
use serde::{Deserialize, Serialize};

/// Controls how the [`AgentPool`](crate::use_cases::agent_pool::AgentPool)
/// picks agents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolConfig {
    pub strategy: LoadBalancingStrategy,
}

impl PoolConfig {
    pub fn with_strategy(mut self, strategy: LoadBalancingStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
