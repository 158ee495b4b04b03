//! Agent definitions from TOML (`[[agents]]` array)

use super::ConfigIssue;
use conclave_domain::{AgentDefinition, AgentRole};
use serde::{Deserialize, Serialize};

/// Raw agent definition from TOML
///
/// ```toml
/// [[agents]]
/// id = "security"
/// name = "Security Reviewer"
/// role = "reviewer"                        # "generalist", "specialist", "reviewer", "coordinator"
/// capabilities = ["security", "review"]
/// triggers = ["vulnerability"]
/// keywords = ["auth", "crypto"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAgentDefinition {
    pub id: String,
    pub name: Option<String>,
    pub role: Option<String>,
    pub capabilities: Vec<String>,
    pub triggers: Vec<String>,
    pub keywords: Vec<String>,
}

impl FileAgentDefinition {
    /// Convert to an [`AgentDefinition`]; an unknown role falls back to
    /// generalist. `field` prefixes the reported issue paths.
    pub fn to_definition(&self, field: &str) -> (AgentDefinition, Vec<ConfigIssue>) {
        let mut issues = Vec::new();
        let role = match self.role.as_deref().map(str::parse::<AgentRole>) {
            None => AgentRole::default(),
            Some(Ok(role)) => role,
            Some(Err(e)) => {
                issues.push(ConfigIssue::new(format!("{}.role", field), e));
                AgentRole::default()
            }
        };

        let mut definition = AgentDefinition::new(self.id.clone(), role)
            .with_capabilities(self.capabilities.iter().cloned())
            .with_triggers(self.triggers.iter().cloned())
            .with_keywords(self.keywords.iter().cloned());
        if let Some(name) = &self.name {
            definition = definition.with_name(name.clone());
        }

        (definition, issues)
    }
}
