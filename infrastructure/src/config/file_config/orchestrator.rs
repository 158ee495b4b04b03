//! Orchestrator configuration from TOML (`[orchestrator]` section)

use super::ConfigIssue;
use conclave_application::OrchestratorConfig;
use conclave_domain::ErrorPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Raw orchestrator configuration from TOML
///
/// ```toml
/// [orchestrator]
/// retry_attempts = 3
/// retry_delay_ms = 1000
/// agent_wait_timeout_ms = 30000
/// task_timeout_seconds = 300      # 0 for no limit
/// parallel_fanout = 3
/// dynamic_on_error = "retry"      # "stop", "continue", "retry"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileOrchestratorConfig {
    pub retry_attempts: u32,
    pub retry_delay_ms: u64,
    pub agent_wait_timeout_ms: u64,
    pub task_timeout_seconds: u64,
    pub parallel_fanout: usize,
    pub dynamic_on_error: String,
}

impl Default for FileOrchestratorConfig {
    fn default() -> Self {
        let defaults = OrchestratorConfig::default();
        Self {
            retry_attempts: defaults.retry_attempts,
            retry_delay_ms: defaults.retry_delay.as_millis() as u64,
            agent_wait_timeout_ms: defaults.agent_wait_timeout.as_millis() as u64,
            task_timeout_seconds: defaults.task_timeout.map_or(0, |t| t.as_secs()),
            parallel_fanout: defaults.parallel_fanout,
            dynamic_on_error: defaults.dynamic_on_error.as_str().to_string(),
        }
    }
}

impl FileOrchestratorConfig {
    /// Convert to [`OrchestratorConfig`]. Invalid fields keep their default.
    pub fn to_orchestrator_config(&self) -> (OrchestratorConfig, Vec<ConfigIssue>) {
        let mut config = OrchestratorConfig::default()
            .with_retry_attempts(self.retry_attempts)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms));
        let mut issues = Vec::new();

        if self.agent_wait_timeout_ms == 0 {
            issues.push(ConfigIssue::new(
                "orchestrator.agent_wait_timeout_ms",
                "agent_wait_timeout_ms cannot be 0",
            ));
        } else {
            config = config.with_agent_wait_timeout(Duration::from_millis(self.agent_wait_timeout_ms));
        }

        let timeout = Some(self.task_timeout_seconds)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs);
        config = config.with_task_timeout(timeout);

        if self.parallel_fanout == 0 {
            issues.push(ConfigIssue::new(
                "orchestrator.parallel_fanout",
                "parallel_fanout cannot be 0",
            ));
        } else {
            config = config.with_parallel_fanout(self.parallel_fanout);
        }

        match self.dynamic_on_error.parse::<ErrorPolicy>() {
            Ok(policy) => config = config.with_dynamic_on_error(policy),
            Err(e) => issues.push(ConfigIssue::new("orchestrator.dynamic_on_error", e)),
        }

        (config, issues)
    }
}
