//! Agent entities: static descriptors and their pooled runtime state.

use serde::{Deserialize, Serialize};

/// Role an agent plays in the pool
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    /// Handles anything, no particular strength
    #[default]
    Generalist,
    /// Strong in a narrow capability set
    Specialist,
    /// Reviews and ranks the work of others
    Reviewer,
    /// Plans and synthesizes across agents
    Coordinator,
}

impl AgentRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentRole::Generalist => "generalist",
            AgentRole::Specialist => "specialist",
            AgentRole::Reviewer => "reviewer",
            AgentRole::Coordinator => "coordinator",
        }
    }
}

impl std::fmt::Display for AgentRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generalist" => Ok(AgentRole::Generalist),
            "specialist" => Ok(AgentRole::Specialist),
            "reviewer" => Ok(AgentRole::Reviewer),
            "coordinator" => Ok(AgentRole::Coordinator),
            _ => Err(format!(
                "Unknown agent role: {}. Valid: generalist, specialist, reviewer, coordinator",
                s
            )),
        }
    }
}

/// Static agent descriptor. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub id: String,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub role: AgentRole,
    /// Capability tags (e.g., "rust", "review", "frontend")
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Phrases that strongly suggest this agent
    #[serde(default)]
    pub triggers: Vec<String>,
    /// Keywords matched against task descriptions
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

fn default_max_concurrency() -> usize {
    1
}

impl AgentDefinition {
    pub fn new(id: impl Into<String>, role: AgentRole) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            role,
            capabilities: Vec::new(),
            triggers: Vec::new(),
            keywords: Vec::new(),
            max_concurrency: default_max_concurrency(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_triggers<I, S>(mut self, triggers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.triggers = triggers.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities
            .iter()
            .any(|c| c.eq_ignore_ascii_case(capability))
    }
}

/// Runtime availability of a pooled agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    #[default]
    Idle,
    Busy,
}

impl AgentStatus {
    pub fn is_idle(&self) -> bool {
        matches!(self, AgentStatus::Idle)
    }
}

/// Cumulative execution statistics of an agent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub total_tasks: u64,
    /// Fraction of tasks that succeeded (0.0 to 1.0)
    pub success_rate: f64,
    /// Running mean duration in milliseconds
    pub avg_duration_ms: f64,
}

impl AgentStats {
    /// Fold one more finished task into the running averages.
    pub fn record(&mut self, success: bool, duration_ms: u64) {
        self.total_tasks += 1;
        let n = self.total_tasks as f64;
        let hit = if success { 1.0 } else { 0.0 };
        self.success_rate = (self.success_rate * (n - 1.0) + hit) / n;
        self.avg_duration_ms = (self.avg_duration_ms * (n - 1.0) + duration_ms as f64) / n;
    }
}

/// An agent definition plus mutable pool state
///
/// Owned by the pool; everything handed out is a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInstance {
    pub definition: AgentDefinition,
    pub status: AgentStatus,
    pub stats: AgentStats,
    /// Position in registration order, used for deterministic tie-breaking
    pub registration_index: usize,
}

impl AgentInstance {
    /// A freshly registered, idle instance with zeroed stats.
    pub fn new(definition: AgentDefinition, registration_index: usize) -> Self {
        Self {
            definition,
            status: AgentStatus::Idle,
            stats: AgentStats::default(),
            registration_index,
        }
    }

    pub fn id(&self) -> &str {
        &self.definition.id
    }

    pub fn role(&self) -> AgentRole {
        self.definition.role
    }

    pub fn is_idle(&self) -> bool {
        self.status.is_idle()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_instance_is_idle_with_zero_stats() {
        let def = AgentDefinition::new("coder", AgentRole::Specialist);
        let agent = AgentInstance::new(def, 0);

        assert!(agent.is_idle());
        assert_eq!(agent.stats.total_tasks, 0);
        assert_eq!(agent.stats.success_rate, 0.0);
        assert_eq!(agent.id(), "coder");
        assert_eq!(agent.definition.name, "coder");
    }

    #[test]
    fn test_stats_running_averages() {
        let mut stats = AgentStats::default();
        stats.record(true, 100);
        stats.record(false, 300);

        assert_eq!(stats.total_tasks, 2);
        assert!((stats.success_rate - 0.5).abs() < f64::EPSILON);
        assert!((stats.avg_duration_ms - 200.0).abs() < f64::EPSILON);

        stats.record(true, 200);
        assert!((stats.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((stats.avg_duration_ms - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_role_parse_and_display() {
        assert_eq!("Reviewer".parse::<AgentRole>().unwrap(), AgentRole::Reviewer);
        assert!("wizard".parse::<AgentRole>().is_err());
        assert_eq!(AgentRole::Coordinator.to_string(), "coordinator");
    }

    #[test]
    fn test_definition_deserialize_defaults() {
        let def: AgentDefinition =
            serde_json::from_str(r#"{"id": "a1", "name": "Alpha"}"#).unwrap();
        assert_eq!(def.role, AgentRole::Generalist);
        assert_eq!(def.max_concurrency, 1);
        assert!(def.capabilities.is_empty());
    }

    #[test]
    fn test_has_capability_case_insensitive() {
        let def = AgentDefinition::new("a", AgentRole::Specialist).with_capabilities(["Rust"]);
        assert!(def.has_capability("rust"));
        assert!(!def.has_capability("go"));
    }
}
