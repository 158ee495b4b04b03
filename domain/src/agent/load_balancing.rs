//! Load balancing policies and agent/task match scoring.
//!
//! Selection is a pure function over a registration-ordered slice of
//! agents; the pool owns the state (statuses, round-robin cursor) and
//! calls [`select_agent`] under its lock.

use super::entities::{AgentInstance, AgentRole};
use crate::core::string::count_keyword_hits;
use crate::task::TaskDefinition;
use serde::{Deserialize, Serialize};

/// Weight of one overlapping required capability
pub const CAPABILITY_WEIGHT: u32 = 10;
/// Weight of one keyword or trigger hit in the description
pub const KEYWORD_WEIGHT: u32 = 2;
/// Extra reviewer bonus when the task asks for a review
pub const REVIEW_TASK_BONUS: u32 = 3;

/// Policy used to pick an idle agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LoadBalancingStrategy {
    /// Cycle through agents in registration order
    RoundRobin,
    /// Prefer the agent with the fewest finished tasks
    LeastLoaded,
    /// Prefer the highest [`match_score`] against the task
    #[default]
    CapabilityMatch,
}

impl LoadBalancingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoadBalancingStrategy::RoundRobin => "round-robin",
            LoadBalancingStrategy::LeastLoaded => "least-loaded",
            LoadBalancingStrategy::CapabilityMatch => "capability-match",
        }
    }
}

impl std::fmt::Display for LoadBalancingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LoadBalancingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "round-robin" => Ok(LoadBalancingStrategy::RoundRobin),
            "least-loaded" => Ok(LoadBalancingStrategy::LeastLoaded),
            "capability-match" | "capability" => Ok(LoadBalancingStrategy::CapabilityMatch),
            _ => Err(format!(
                "Unknown load balancing strategy: {}. Valid: round-robin, least-loaded, capability-match",
                s
            )),
        }
    }
}

/// Role-based constant added to every match score.
fn role_bonus(role: AgentRole, description: &str) -> u32 {
    match role {
        AgentRole::Specialist => 3,
        AgentRole::Reviewer => {
            if description.contains("review") || description.contains("audit") {
                2 + REVIEW_TASK_BONUS
            } else {
                2
            }
        }
        AgentRole::Coordinator | AgentRole::Generalist => 1,
    }
}

/// Deterministic suitability score of `agent` for `task`. Higher is better.
///
/// `10 × overlapping required capabilities + 2 × keyword/trigger hits + role constant`
pub fn match_score(agent: &AgentInstance, task: &TaskDefinition) -> u32 {
    let definition = &agent.definition;
    let description = task.normalized_description();

    let overlap = task
        .required_capabilities
        .iter()
        .filter(|c| definition.has_capability(c))
        .count() as u32;

    let hits = count_keyword_hits(
        &description,
        definition.keywords.iter().chain(definition.triggers.iter()),
    );

    overlap * CAPABILITY_WEIGHT + hits * KEYWORD_WEIGHT + role_bonus(definition.role, &description)
}

fn is_candidate(agent: &AgentInstance, roles: &[AgentRole]) -> bool {
    agent.is_idle() && (roles.is_empty() || roles.contains(&agent.role()))
}

/// Pick an idle agent according to `strategy`.
///
/// `agents` must be in registration order. `cursor` is the round-robin
/// position: the index the next rotation starts from. Returns the index of
/// the chosen agent, or `None` when no candidate is idle.
pub fn select_agent(
    strategy: LoadBalancingStrategy,
    agents: &[AgentInstance],
    cursor: usize,
    task: Option<&TaskDefinition>,
    roles: &[AgentRole],
) -> Option<usize> {
    if agents.is_empty() {
        return None;
    }

    let n = agents.len();
    let rotation = (0..n).map(|k| (cursor + k) % n);

    match (strategy, task) {
        (LoadBalancingStrategy::RoundRobin, _) | (LoadBalancingStrategy::CapabilityMatch, None) => {
            rotation.into_iter().find(|&i| is_candidate(&agents[i], roles))
        }
        (LoadBalancingStrategy::LeastLoaded, _) => agents
            .iter()
            .enumerate()
            .filter(|(_, a)| is_candidate(a, roles))
            .min_by_key(|(i, a)| (a.stats.total_tasks, *i))
            .map(|(i, _)| i),
        (LoadBalancingStrategy::CapabilityMatch, Some(task)) => {
            let mut best: Option<(usize, u32)> = None;
            for i in rotation.filter(|&i| is_candidate(&agents[i], roles)) {
                let score = match_score(&agents[i], task);
                if best.is_none_or(|(_, s)| score > s) {
                    best = Some((i, score));
                }
            }
            best.map(|(i, _)| i)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::entities::{AgentDefinition, AgentStatus};

    fn agent(id: &str, role: AgentRole, index: usize) -> AgentInstance {
        AgentInstance::new(AgentDefinition::new(id, role), index)
    }

    fn pool() -> Vec<AgentInstance> {
        vec![
            agent("a", AgentRole::Generalist, 0),
            agent("b", AgentRole::Generalist, 1),
            agent("c", AgentRole::Generalist, 2),
        ]
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "round_robin".parse::<LoadBalancingStrategy>().unwrap(),
            LoadBalancingStrategy::RoundRobin
        );
        assert_eq!(
            "Least-Loaded".parse::<LoadBalancingStrategy>().unwrap(),
            LoadBalancingStrategy::LeastLoaded
        );
        assert!("random".parse::<LoadBalancingStrategy>().is_err());
        assert_eq!(
            LoadBalancingStrategy::default(),
            LoadBalancingStrategy::CapabilityMatch
        );
    }

    #[test]
    fn test_match_score_weights() {
        let rust_dev = AgentInstance::new(
            AgentDefinition::new("rust-dev", AgentRole::Specialist)
                .with_capabilities(["rust", "async"])
                .with_keywords(["tokio"]),
            0,
        );
        let task = TaskDefinition::new("t", "Port the Tokio runtime glue")
            .with_capabilities(["rust", "async", "python"]);

        // 2 capabilities * 10 + 1 keyword * 2 + specialist 3
        assert_eq!(match_score(&rust_dev, &task), 25);
    }

    #[test]
    fn test_match_score_reviewer_bonus() {
        let reviewer = agent("rev", AgentRole::Reviewer, 0);
        let review_task = TaskDefinition::new("t", "Review the pull request");
        let other_task = TaskDefinition::new("t", "Write the parser");

        assert!(match_score(&reviewer, &review_task) > match_score(&reviewer, &other_task));
    }

    #[test]
    fn test_round_robin_skips_busy() {
        let mut agents = pool();
        agents[1].status = AgentStatus::Busy;

        let picked = select_agent(LoadBalancingStrategy::RoundRobin, &agents, 1, None, &[]);
        assert_eq!(picked, Some(2));
    }

    #[test]
    fn test_round_robin_wraps() {
        let agents = pool();
        let picked = select_agent(LoadBalancingStrategy::RoundRobin, &agents, 4, None, &[]);
        assert_eq!(picked, Some(1));
    }

    #[test]
    fn test_least_loaded_prefers_fresh_agent() {
        let mut agents = pool();
        agents[0].stats.total_tasks = 2;
        agents[1].stats.total_tasks = 0;
        agents[2].stats.total_tasks = 0;

        let picked = select_agent(LoadBalancingStrategy::LeastLoaded, &agents, 0, None, &[]);
        assert_eq!(picked, Some(1));
    }

    #[test]
    fn test_capability_match_picks_best_and_breaks_ties_by_rotation() {
        let mut agents = pool();
        agents[2].definition.capabilities = vec!["rust".to_string()];
        let task = TaskDefinition::new("t", "write code").with_capabilities(["rust"]);

        let picked = select_agent(LoadBalancingStrategy::CapabilityMatch, &agents, 0, Some(&task), &[]);
        assert_eq!(picked, Some(2));

        // All equal: first in rotation order from the cursor wins
        let plain = TaskDefinition::new("t", "anything");
        let picked = select_agent(LoadBalancingStrategy::CapabilityMatch, &agents, 1, Some(&plain), &[]);
        assert_eq!(picked, Some(1));
    }

    #[test]
    fn test_role_filter() {
        let mut agents = pool();
        agents.push(agent("r", AgentRole::Reviewer, 3));

        let picked = select_agent(
            LoadBalancingStrategy::RoundRobin,
            &agents,
            0,
            None,
            &[AgentRole::Reviewer],
        );
        assert_eq!(picked, Some(3));

        agents[3].status = AgentStatus::Busy;
        let picked = select_agent(
            LoadBalancingStrategy::LeastLoaded,
            &agents,
            0,
            None,
            &[AgentRole::Reviewer],
        );
        assert_eq!(picked, None);
    }

    #[test]
    fn test_empty_pool() {
        assert_eq!(
            select_agent(LoadBalancingStrategy::CapabilityMatch, &[], 0, None, &[]),
            None
        );
    }
}
