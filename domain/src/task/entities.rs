//! Task entities: caller-submitted tasks and decomposed sub-tasks.

use serde::{Deserialize, Serialize};

/// Priority of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "normal" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(format!(
                "Unknown priority: {}. Valid: low, medium, high, critical",
                s
            )),
        }
    }
}

/// A unit of work submitted to the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDefinition {
    /// Unique identifier
    pub id: String,
    /// Free-text description of the work
    pub description: String,
    /// Scheduling priority
    #[serde(default)]
    pub priority: Priority,
    /// Capability tags an agent should have (empty = no requirement)
    #[serde(default)]
    pub required_capabilities: Vec<String>,
}

impl TaskDefinition {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            priority: Priority::default(),
            required_capabilities: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }

    /// Lowercased description, the form every matcher works against.
    pub fn normalized_description(&self) -> String {
        self.description.to_lowercase()
    }
}

/// A node of the sub-task graph produced by decomposition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubTask {
    /// Unique identifier within the decomposition
    pub id: String,
    /// Id of the task this was decomposed from
    pub parent_id: String,
    /// Short title (e.g., "Design", "Reproduce")
    pub title: String,
    /// What the executing agent should do
    pub description: String,
    /// Inherited from the parent unless overridden
    pub priority: Priority,
    /// Ids of sub-tasks that must finish first
    pub dependencies: Vec<String>,
    /// Capability hints used when matching an agent
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl SubTask {
    /// Create a sub-task of `parent` with no dependencies.
    ///
    /// The id is `<parent id>-<suffix>`.
    pub fn of(
        parent: &TaskDefinition,
        suffix: &str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: format!("{}-{}", parent.id, suffix),
            parent_id: parent.id.clone(),
            title: title.into(),
            description: description.into(),
            priority: parent.priority,
            dependencies: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
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

    /// Convert into a standalone task for execution against the pool.
    pub fn to_task(&self) -> TaskDefinition {
        TaskDefinition {
            id: self.id.clone(),
            description: self.description.clone(),
            priority: self.priority,
            required_capabilities: self.capabilities.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::Critical > Priority::High);
        assert!(Priority::High > Priority::Medium);
        assert!(Priority::Medium > Priority::Low);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("CRITICAL".parse::<Priority>().unwrap(), Priority::Critical);
        assert_eq!("normal".parse::<Priority>().unwrap(), Priority::Medium);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_subtask_inherits_priority() {
        let task = TaskDefinition::new("t1", "Fix login bug").with_priority(Priority::High);
        let sub = SubTask::of(&task, "reproduce", "Reproduce", "Reproduce the bug");

        assert_eq!(sub.id, "t1-reproduce");
        assert_eq!(sub.parent_id, "t1");
        assert_eq!(sub.priority, Priority::High);
        assert!(sub.dependencies.is_empty());
    }

    #[test]
    fn test_subtask_to_task_carries_capabilities() {
        let task = TaskDefinition::new("t1", "Build feature");
        let sub = SubTask::of(&task, "review", "Review", "Review the change")
            .with_capabilities(["review"])
            .depends_on("t1-implement");

        let converted = sub.to_task();
        assert_eq!(converted.id, "t1-review");
        assert_eq!(converted.required_capabilities, vec!["review".to_string()]);
        assert_eq!(sub.dependencies, vec!["t1-implement".to_string()]);
    }

    #[test]
    fn test_task_definition_deserialize_defaults() {
        let task: TaskDefinition =
            serde_json::from_str(r#"{"id": "a", "description": "Do it"}"#).unwrap();
        assert_eq!(task.priority, Priority::Medium);
        assert!(task.required_capabilities.is_empty());
    }
}
