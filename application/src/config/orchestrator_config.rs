//! Orchestrator configuration: retries, waiting and fan-out.

use conclave_domain::ErrorPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Execution control for the [`Orchestrator`](crate::use_cases::orchestrator::Orchestrator).
///
/// | Field | Default | Meaning |
/// |-------|---------|---------|
/// | `retry_attempts` | 3 | extra attempts after the first failure |
/// | `retry_delay` | 1s | pause between attempts (no agent held) |
/// | `agent_wait_timeout` | 30s | how long to wait for an idle agent |
/// | `task_timeout` | 300s | per-attempt executor timeout |
/// | `parallel_fanout` | 3 | max agents for a parallel step |
/// | `dynamic_on_error` | retry | error policy of decomposed runs |
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub agent_wait_timeout: Duration,
    pub task_timeout: Option<Duration>,
    pub parallel_fanout: usize,
    pub dynamic_on_error: ErrorPolicy,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
            agent_wait_timeout: Duration::from_secs(30),
            task_timeout: Some(Duration::from_secs(300)),
            parallel_fanout: 3,
            dynamic_on_error: ErrorPolicy::Retry,
        }
    }
}

impl OrchestratorConfig {
    // ==================== Builder Methods ====================

    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn with_agent_wait_timeout(mut self, timeout: Duration) -> Self {
        self.agent_wait_timeout = timeout;
        self
    }

    pub fn with_task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }

    pub fn with_parallel_fanout(mut self, fanout: usize) -> Self {
        self.parallel_fanout = fanout;
        self
    }

    pub fn with_dynamic_on_error(mut self, policy: ErrorPolicy) -> Self {
        self.dynamic_on_error = policy;
        self
    }

    /// Total attempts for one task: the first plus the retries
    pub fn max_attempts(&self) -> u32 {
        self.retry_attempts.saturating_add(1)
    }
}
