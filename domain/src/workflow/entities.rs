//! Workflow entities: workflows and their steps.

use super::context::WorkflowContext;
use crate::agent::AgentRole;
use crate::decomposition::DecompositionResult;
use crate::task::{Priority, SubTask, TaskDefinition};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// How a step uses agents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionStrategy {
    /// One agent runs the step
    #[default]
    Sequential,
    /// Several agents run the step concurrently; one success is enough
    Parallel,
}

impl ExecutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStrategy::Sequential => "sequential",
            ExecutionStrategy::Parallel => "parallel",
        }
    }
}

impl std::fmt::Display for ExecutionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What to do after a batch in which a step failed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Abort the remaining batches
    #[default]
    Stop,
    /// Keep going; dependants of the failed step are skipped
    Continue,
    /// Re-run failed steps with retries, abort if they still fail
    Retry,
}

impl ErrorPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorPolicy::Stop => "stop",
            ErrorPolicy::Continue => "continue",
            ErrorPolicy::Retry => "retry",
        }
    }
}

impl std::fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "stop" => Ok(ErrorPolicy::Stop),
            "continue" => Ok(ErrorPolicy::Continue),
            "retry" => Ok(ErrorPolicy::Retry),
            _ => Err(format!(
                "Unknown error policy: {}. Valid: stop, continue, retry",
                s
            )),
        }
    }
}

/// Predicate deciding whether a step runs
pub type StepCondition = Arc<dyn Fn(&WorkflowContext) -> bool + Send + Sync>;

/// One node of a workflow
#[derive(Clone, Default)]
pub struct WorkflowStep {
    pub id: String,
    pub name: String,
    /// Instruction template sent to the agent; may contain `{{key}}`
    pub action: String,
    pub strategy: ExecutionStrategy,
    pub dependencies: Vec<String>,
    /// Eligible roles (empty = any)
    pub roles: Vec<AgentRole>,
    pub capabilities: Vec<String>,
    pub priority: Priority,
    /// Values may contain `{{key}}` placeholders
    pub params: BTreeMap<String, String>,
    pub condition: Option<StepCondition>,
}

impl WorkflowStep {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn parallel(mut self) -> Self {
        self.strategy = ExecutionStrategy::Parallel;
        self
    }

    pub fn depends_on(mut self, id: impl Into<String>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn with_roles(mut self, roles: impl IntoIterator<Item = AgentRole>) -> Self {
        self.roles = roles.into_iter().collect();
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

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_condition<F>(mut self, condition: F) -> Self
    where
        F: Fn(&WorkflowContext) -> bool + Send + Sync + 'static,
    {
        self.condition = Some(Arc::new(condition));
        self
    }

    /// Whether the step should run; steps without a condition always do.
    pub fn should_run(&self, context: &WorkflowContext) -> bool {
        self.condition.as_ref().is_none_or(|c| c(context))
    }

    /// A step running one decomposed sub-task.
    pub fn from_subtask(subtask: &SubTask) -> Self {
        Self {
            id: subtask.id.clone(),
            name: subtask.title.clone(),
            action: subtask.description.clone(),
            dependencies: subtask.dependencies.clone(),
            capabilities: subtask.capabilities.clone(),
            priority: subtask.priority,
            ..Default::default()
        }
    }

    /// Task handed to the executor once the action has been resolved.
    pub fn to_task(&self, description: impl Into<String>) -> TaskDefinition {
        TaskDefinition::new(self.id.clone(), description)
            .with_priority(self.priority)
            .with_capabilities(self.capabilities.iter().cloned())
    }
}

impl std::fmt::Debug for WorkflowStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowStep")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("action", &self.action)
            .field("strategy", &self.strategy)
            .field("dependencies", &self.dependencies)
            .field("roles", &self.roles)
            .field("capabilities", &self.capabilities)
            .field("priority", &self.priority)
            .field("params", &self.params)
            .field("condition", &self.condition.is_some())
            .finish()
    }
}

/// A registered, reusable workflow
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<WorkflowStep>,
    pub on_error: ErrorPolicy,
    /// Overrides the orchestrator's retry count under [`ErrorPolicy::Retry`]
    pub max_retries: Option<u32>,
}

impl Workflow {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_step(mut self, step: WorkflowStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn with_on_error(mut self, policy: ErrorPolicy) -> Self {
        self.on_error = policy;
        self
    }

    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn step(&self, id: &str) -> Option<&WorkflowStep> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Ad-hoc workflow running the sub-tasks of a decomposition.
    pub fn from_decomposition(
        task: &TaskDefinition,
        decomposition: &DecompositionResult,
        on_error: ErrorPolicy,
    ) -> Self {
        Self {
            id: format!("dynamic-{}", task.id),
            name: format!("Dynamic: {}", decomposition.pattern),
            description: task.description.clone(),
            steps: decomposition
                .subtasks
                .iter()
                .map(WorkflowStep::from_subtask)
                .collect(),
            on_error,
            max_retries: None,
        }
    }
}
