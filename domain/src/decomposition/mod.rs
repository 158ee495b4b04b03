//! Task decomposition
//!
//! Expands a high-level [`TaskDefinition`] into [`SubTask`]s using an
//! ordered registry of regex patterns, then layers them into batches that
//! can run in parallel.

pub mod complexity;
pub mod layering;
pub mod patterns;

pub use complexity::{COMPLEXITY_INDICATORS, calculate_complexity, indicator_count};
pub use layering::{Layering, layer_by_dependencies};
pub use patterns::{DecompositionPattern, SubTaskGenerator, builtin_patterns};

use crate::core::error::DomainError;
use crate::task::{SubTask, TaskDefinition};
use regex::Captures;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Output of [`TaskDecomposer::decompose`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecompositionResult {
    pub task_id: String,
    /// Name of the pattern that produced the sub-tasks
    pub pattern: String,
    pub subtasks: Vec<SubTask>,
    /// Sub-task ids grouped into dependency-ordered batches
    pub parallel_groups: Vec<Vec<String>>,
    /// Sub-tasks that could not be placed (cycle or unknown dependency)
    pub unresolved: Vec<String>,
    pub complexity: u8,
}

impl DecompositionResult {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }

    pub fn subtask(&self, id: &str) -> Option<&SubTask> {
        self.subtasks.iter().find(|s| s.id == id)
    }
}

/// Pattern registry: user patterns first (registration order), then
/// built-ins ending with the generic fallback.
#[derive(Debug, Clone)]
pub struct TaskDecomposer {
    custom: Vec<DecompositionPattern>,
    builtin: Vec<DecompositionPattern>,
}

impl Default for TaskDecomposer {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskDecomposer {
    pub fn new() -> Self {
        Self {
            custom: Vec::new(),
            builtin: builtin_patterns(),
        }
    }

    /// Register a user pattern. Re-registering a name replaces the earlier
    /// pattern in place.
    pub fn register_pattern<F>(
        &mut self,
        name: impl Into<String>,
        matcher: &str,
        generator: F,
    ) -> Result<(), DomainError>
    where
        F: Fn(&TaskDefinition, &Captures<'_>) -> Vec<SubTask> + Send + Sync + 'static,
    {
        let pattern = DecompositionPattern::compile(name, matcher, generator)?;
        self.add_pattern(pattern);
        Ok(())
    }

    /// Register an already compiled pattern.
    pub fn add_pattern(&mut self, pattern: DecompositionPattern) {
        match self.custom.iter_mut().find(|p| p.name == pattern.name) {
            Some(existing) => *existing = pattern,
            None => self.custom.push(pattern),
        }
    }

    /// Pattern names in match order.
    pub fn pattern_names(&self) -> Vec<&str> {
        self.patterns().map(|p| p.name.as_str()).collect()
    }

    fn patterns(&self) -> impl Iterator<Item = &DecompositionPattern> {
        self.custom.iter().chain(self.builtin.iter())
    }

    /// Complexity score of `task` on a 1-10 scale.
    pub fn calculate_complexity(&self, task: &TaskDefinition) -> u8 {
        calculate_complexity(task)
    }

    /// Decompose `task` with the first pattern whose matcher accepts it and
    /// whose generator yields at least one sub-task.
    pub fn decompose(&self, task: &TaskDefinition) -> DecompositionResult {
        let normalized = task.normalized_description();

        let (pattern, subtasks) = self
            .patterns()
            .find_map(|p| {
                p.apply(task, &normalized)
                    .filter(|subtasks| !subtasks.is_empty())
                    .map(|subtasks| (p.name.clone(), subtasks))
            })
            .unwrap_or_else(|| (patterns::GENERIC_PATTERN_NAME.to_string(), Vec::new()));

        let layering = layer_by_dependencies(
            subtasks
                .iter()
                .map(|s| (s.id.as_str(), s.dependencies.as_slice())),
        );

        if !layering.is_complete() {
            warn!(
                task_id = %task.id,
                pattern = %pattern,
                unresolved = ?layering.unresolved,
                "Decomposition stalled: sub-tasks with cyclic or unknown dependencies"
            );
        }

        debug!(
            task_id = %task.id,
            pattern = %pattern,
            subtasks = subtasks.len(),
            batches = layering.batches.len(),
            "Task decomposed"
        );

        DecompositionResult {
            task_id: task.id.clone(),
            pattern,
            complexity: calculate_complexity(task),
            subtasks,
            parallel_groups: layering.batches,
            unresolved: layering.unresolved,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Priority;

    #[test]
    fn test_feature_task_layers_into_chain() {
        let decomposer = TaskDecomposer::new();
        let task = TaskDefinition::new("dash", "Implement user dashboard feature");

        let result = decomposer.decompose(&task);
        assert_eq!(result.pattern, "feature");
        assert_eq!(result.subtasks.len(), 4);
        assert_eq!(
            result.parallel_groups,
            vec![
                vec!["dash-design".to_string()],
                vec!["dash-implement".to_string()],
                vec!["dash-test".to_string()],
                vec!["dash-review".to_string()],
            ]
        );
        assert!(result.is_complete());
    }

    #[test]
    fn test_multi_file_is_one_batch() {
        let decomposer = TaskDecomposer::new();
        let task = TaskDefinition::new("m", "Refactor logging in [a.rs, b.rs, c.rs]");

        let result = decomposer.decompose(&task);
        assert_eq!(result.pattern, "multi-file");
        assert_eq!(result.parallel_groups.len(), 1);
        assert_eq!(result.parallel_groups[0].len(), 3);
    }

    #[test]
    fn test_bug_fix_beats_feature() {
        let decomposer = TaskDecomposer::new();
        let task = TaskDefinition::new("b", "Fix the crash bug in the new export feature");
        assert_eq!(decomposer.decompose(&task).pattern, "bug-fix");
    }

    #[test]
    fn test_generic_fallback() {
        let decomposer = TaskDecomposer::new();
        let task = TaskDefinition::new("g", "Write the quarterly report");

        let result = decomposer.decompose(&task);
        assert_eq!(result.pattern, "generic");
        let titles: Vec<&str> = result.subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Analyze", "Plan", "Execute", "Validate"]);
    }

    #[test]
    fn test_subtasks_inherit_priority() {
        let decomposer = TaskDecomposer::new();
        let task = TaskDefinition::new("p", "Write docs").with_priority(Priority::High);
        let result = decomposer.decompose(&task);
        assert!(result.subtasks.iter().all(|s| s.priority == Priority::High));
    }

    #[test]
    fn test_custom_pattern_checked_first_and_replaceable() {
        let mut decomposer = TaskDecomposer::new();
        decomposer
            .register_pattern("docs", r"\bdocs?\b", |task, _| {
                vec![SubTask::of(task, "write", "Write", "Write the docs")]
            })
            .unwrap();
        decomposer
            .register_pattern("docs", r"\bdocs?\b", |task, _| {
                vec![
                    SubTask::of(task, "outline", "Outline", "Outline the docs"),
                    SubTask::of(task, "write", "Write", "Write the docs").depends_on("d-outline"),
                ]
            })
            .unwrap();

        assert_eq!(
            decomposer.pattern_names(),
            vec!["docs", "multi-file", "bug-fix", "feature", "generic"]
        );

        let result = decomposer.decompose(&TaskDefinition::new("d", "Implement docs"));
        assert_eq!(result.pattern, "docs");
        assert_eq!(result.subtasks.len(), 2);
        assert_eq!(result.parallel_groups.len(), 2);
    }

    #[test]
    fn test_empty_generator_output_falls_through() {
        let mut decomposer = TaskDecomposer::new();
        decomposer
            .register_pattern("nothing", r".*", |_, _| Vec::new())
            .unwrap();

        let result = decomposer.decompose(&TaskDefinition::new("x", "Write docs"));
        assert_eq!(result.pattern, "generic");
    }

    #[test]
    fn test_cycle_reported_as_unresolved() {
        let mut decomposer = TaskDecomposer::new();
        decomposer
            .register_pattern("loop", r"^loop", |task, _| {
                vec![
                    SubTask::of(task, "root", "Root", "root"),
                    SubTask::of(task, "a", "A", "a").depends_on("c-b"),
                    SubTask::of(task, "b", "B", "b").depends_on("c-a"),
                ]
            })
            .unwrap();

        let result = decomposer.decompose(&TaskDefinition::new("c", "loop forever"));
        assert_eq!(result.parallel_groups, vec![vec!["c-root".to_string()]]);
        assert_eq!(result.unresolved, vec!["c-a".to_string(), "c-b".to_string()]);
        assert!(!result.is_complete());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let mut decomposer = TaskDecomposer::new();
        let err = decomposer
            .register_pattern("bad", "[", |_, _| Vec::new())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidPattern { .. }));
        assert_eq!(decomposer.pattern_names().len(), 4);
    }

    #[test]
    fn test_complexity_attached() {
        let decomposer = TaskDecomposer::new();
        let task = TaskDefinition::new("s", "Add encryption to the sync protocol");
        let result = decomposer.decompose(&task);
        assert_eq!(result.complexity, decomposer.calculate_complexity(&task));
        assert!(result.complexity >= 3);
    }
}
