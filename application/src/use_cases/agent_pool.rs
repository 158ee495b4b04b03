//! Agent pool
//!
//! Registry of agents with idle/busy bookkeeping and load-balanced
//! acquisition. All state sits behind one mutex that is never held across
//! an await; releases wake waiters through a [`Notify`].

use crate::config::PoolConfig;
use crate::ports::event_observer::{EventObserver, NoObserver};
use conclave_domain::agent::select_agent;
use conclave_domain::{
    AgentDefinition, AgentInstance, AgentRole, AgentStatus, OrchestrationEvent, PoolStats,
    TaskDefinition, TaskOutcome, match_score,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Notify;
use tokio::time::Instant;
use tracing::debug;

/// Errors from pool operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Agent not found: {0}")]
    AgentNotFound(String),
}

#[derive(Default)]
struct PoolState {
    /// Registration order
    agents: Vec<AgentInstance>,
    /// Next round-robin start position
    cursor: usize,
}

/// Pool of interchangeable agents
pub struct AgentPool {
    config: PoolConfig,
    state: Mutex<PoolState>,
    released: Notify,
    observer: Arc<dyn EventObserver>,
}

impl AgentPool {
    pub fn new(config: PoolConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PoolState::default()),
            released: Notify::new(),
            observer: Arc::new(NoObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn EventObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn lock(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an agent, or replace the one with the same id.
    ///
    /// The stored instance is idle with zeroed stats; a replaced agent
    /// keeps its registration position.
    pub fn register_agent(&self, definition: AgentDefinition) -> AgentInstance {
        let event = OrchestrationEvent::AgentRegistered {
            agent_id: definition.id.clone(),
            role: definition.role,
        };

        let instance = {
            let mut state = self.lock();
            match state.agents.iter().position(|a| a.id() == definition.id) {
                Some(index) => {
                    state.agents[index] = AgentInstance::new(definition, index);
                    state.agents[index].clone()
                }
                None => {
                    let index = state.agents.len();
                    state.agents.push(AgentInstance::new(definition, index));
                    state.agents[index].clone()
                }
            }
        };

        debug!(agent_id = %instance.id(), role = %instance.role(), "Agent registered");
        self.observer.on_event(&event);
        // A fresh idle agent may unblock a waiter
        self.released.notify_waiters();
        instance
    }

    /// Snapshot of one agent
    pub fn get_agent(&self, id: &str) -> Option<AgentInstance> {
        self.lock().agents.iter().find(|a| a.id() == id).cloned()
    }

    /// Snapshot of every agent in registration order
    pub fn agents(&self) -> Vec<AgentInstance> {
        self.lock().agents.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().agents.is_empty()
    }

    /// Acquire any idle agent for `task`. Never blocks.
    pub fn acquire_agent(&self, task: Option<&TaskDefinition>) -> Option<AgentInstance> {
        self.acquire_agent_with_roles(task, &[])
    }

    /// Acquire an idle agent whose role is in `roles` (empty = any).
    ///
    /// The chosen agent is marked busy before the lock is released, so two
    /// callers can never receive the same agent.
    pub fn acquire_agent_with_roles(
        &self,
        task: Option<&TaskDefinition>,
        roles: &[AgentRole],
    ) -> Option<AgentInstance> {
        let acquired = {
            let mut state = self.lock();
            let index = select_agent(self.config.strategy, &state.agents, state.cursor, task, roles)?;
            state.agents[index].status = AgentStatus::Busy;
            state.cursor = (index + 1) % state.agents.len();
            state.agents[index].clone()
        };

        debug!(
            agent_id = %acquired.id(),
            strategy = %self.config.strategy,
            task_id = task.map(|t| t.id.as_str()),
            "Agent acquired"
        );
        self.observer.on_event(&OrchestrationEvent::AgentAcquired {
            agent_id: acquired.id().to_string(),
            task_id: task.map(|t| t.id.clone()),
        });
        Some(acquired)
    }

    /// Acquire an agent, waiting up to `timeout` for one to be released.
    pub async fn acquire_agent_waiting(
        &self,
        task: Option<&TaskDefinition>,
        roles: &[AgentRole],
        timeout: Duration,
    ) -> Option<AgentInstance> {
        let deadline = Instant::now() + timeout;

        loop {
            // Register interest before checking, so a release between the
            // check and the await is not missed
            let notified = self.released.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(agent) = self.acquire_agent_with_roles(task, roles) {
                return Some(agent);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                debug!(
                    task_id = task.map(|t| t.id.as_str()),
                    timeout_ms = timeout.as_millis() as u64,
                    "No agent became available"
                );
                return None;
            }
        }
    }

    /// Mark an agent idle, folding `outcome` into its stats.
    pub fn release_agent(&self, id: &str, outcome: Option<TaskOutcome>) -> Result<(), PoolError> {
        {
            let mut state = self.lock();
            let agent = state
                .agents
                .iter_mut()
                .find(|a| a.id() == id)
                .ok_or_else(|| PoolError::AgentNotFound(id.to_string()))?;

            agent.status = AgentStatus::Idle;
            if let Some(outcome) = outcome {
                agent.stats.record(outcome.success, outcome.duration_ms);
            }
        }

        debug!(agent_id = %id, success = outcome.map(|o| o.success), "Agent released");
        self.released.notify_waiters();
        self.observer.on_event(&OrchestrationEvent::AgentReleased {
            agent_id: id.to_string(),
            success: outcome.map(|o| o.success),
        });
        Ok(())
    }

    /// Suitability of `agent` for `task`
    pub fn match_score(&self, agent: &AgentInstance, task: &TaskDefinition) -> u32 {
        match_score(agent, task)
    }

    pub fn get_stats(&self) -> PoolStats {
        PoolStats::summarize(&self.lock().agents)
    }
}

impl Default for AgentPool {
    fn default() -> Self {
        Self::new(PoolConfig::default())
    }
}
