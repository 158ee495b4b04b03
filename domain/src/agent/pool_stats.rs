//! Aggregate snapshot of a pool of agents.

use super::entities::{AgentInstance, AgentRole};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum number of agents listed in [`PoolStats::top_performers`]
pub const TOP_PERFORMERS: usize = 5;

/// Per-agent entry of the top performer list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformerSummary {
    pub agent_id: String,
    pub success_rate: f64,
    pub total_tasks: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoolStats {
    pub total: usize,
    pub available: usize,
    pub busy: usize,
    pub by_role: BTreeMap<AgentRole, usize>,
    /// Agents with at least one finished task, best first
    pub top_performers: Vec<PerformerSummary>,
}

impl PoolStats {
    /// Summarize `agents` (registration order).
    ///
    /// Top performers are sorted by success rate, then total tasks, both
    /// descending; remaining ties keep registration order.
    pub fn summarize(agents: &[AgentInstance]) -> Self {
        let available = agents.iter().filter(|a| a.is_idle()).count();

        let mut by_role = BTreeMap::new();
        for agent in agents {
            *by_role.entry(agent.role()).or_insert(0) += 1;
        }

        let mut ranked: Vec<&AgentInstance> =
            agents.iter().filter(|a| a.stats.total_tasks > 0).collect();
        ranked.sort_by(|a, b| {
            b.stats
                .success_rate
                .total_cmp(&a.stats.success_rate)
                .then(b.stats.total_tasks.cmp(&a.stats.total_tasks))
        });

        let top_performers = ranked
            .into_iter()
            .take(TOP_PERFORMERS)
            .map(|a| PerformerSummary {
                agent_id: a.id().to_string(),
                success_rate: a.stats.success_rate,
                total_tasks: a.stats.total_tasks,
            })
            .collect();

        Self {
            total: agents.len(),
            available,
            busy: agents.len() - available,
            by_role,
            top_performers,
        }
    }
}
