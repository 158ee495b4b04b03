//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Enum-like fields stay strings here and are parsed into domain and
//! application types by the `to_*` methods, which report every problem as a
//! [`ConfigIssue`] instead of failing on the first one.

mod agents;
mod council;
mod logging;
mod orchestrator;
mod pool;

pub use agents::FileAgentDefinition;
pub use council::FileCouncilConfig;
pub use logging::FileLoggingConfig;
pub use orchestrator::FileOrchestratorConfig;
pub use pool::FilePoolConfig;

use conclave_application::{CouncilConfig, OrchestratorConfig, PoolConfig};
use conclave_domain::AgentDefinition;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A problem found while validating the configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigIssue {
    /// Dotted path of the offending field, e.g. `pool.strategy`
    pub field: String,
    pub message: String,
}

impl ConfigIssue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Agent selection settings
    pub pool: FilePoolConfig,
    /// Workflow execution settings
    pub orchestrator: FileOrchestratorConfig,
    /// Council deliberation settings
    pub council: FileCouncilConfig,
    /// Diagnostics and event log
    pub logging: FileLoggingConfig,
    /// Agents registered at startup (`[[agents]]`)
    pub agents: Vec<FileAgentDefinition>,
}

impl FileConfig {
    /// Validate the entire configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<ConfigIssue> {
        let mut issues = Vec::new();

        issues.extend(self.pool.to_pool_config().1);
        issues.extend(self.orchestrator.to_orchestrator_config().1);
        issues.extend(self.council.to_council_config().1);
        issues.extend(self.agent_definitions().1);

        issues
    }

    pub fn pool_config(&self) -> PoolConfig {
        self.pool.to_pool_config().0
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        self.orchestrator.to_orchestrator_config().0
    }

    pub fn council_config(&self) -> CouncilConfig {
        self.council.to_council_config().0
    }

    /// Agent definitions in file order. Entries with an empty or repeated
    /// id are dropped and reported.
    pub fn agent_definitions(&self) -> (Vec<AgentDefinition>, Vec<ConfigIssue>) {
        let mut definitions = Vec::new();
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for (index, agent) in self.agents.iter().enumerate() {
            let field = format!("agents[{}]", index);
            if agent.id.trim().is_empty() {
                issues.push(ConfigIssue::new(format!("{}.id", field), "agent id cannot be empty"));
                continue;
            }
            if !seen.insert(agent.id.as_str()) {
                issues.push(ConfigIssue::new(
                    format!("{}.id", field),
                    format!("duplicate agent id '{}'", agent.id),
                ));
                continue;
            }
            let (definition, agent_issues) = agent.to_definition(&field);
            issues.extend(agent_issues);
            definitions.push(definition);
        }

        (definitions, issues)
    }
}
