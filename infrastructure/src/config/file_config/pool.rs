//! Pool configuration from TOML (`[pool]` section)

use super::ConfigIssue;
use conclave_application::PoolConfig;
use conclave_domain::LoadBalancingStrategy;
use serde::{Deserialize, Serialize};

/// Raw pool configuration from TOML
///
/// ```toml
/// [pool]
/// strategy = "capability-match"   # "round-robin", "least-loaded", "capability-match"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePoolConfig {
    pub strategy: String,
}

impl Default for FilePoolConfig {
    fn default() -> Self {
        Self {
            strategy: LoadBalancingStrategy::default().as_str().to_string(),
        }
    }
}

impl FilePoolConfig {
    pub fn to_pool_config(&self) -> (PoolConfig, Vec<ConfigIssue>) {
        match self.strategy.parse::<LoadBalancingStrategy>() {
            Ok(strategy) => (PoolConfig::default().with_strategy(strategy), vec![]),
            Err(e) => (
                PoolConfig::default(),
                vec![ConfigIssue::new("pool.strategy", e)],
            ),
        }
    }
}
