//! Decomposition patterns: a matcher plus a sub-task generator.
//!
//! Built-in patterns, in the order they are tried:
//!
//! | Name | Trigger | Sub-tasks |
//! |------|---------|-----------|
//! | `multi-file` | `update/modify/refactor/... [a, b]` | one independent sub-task per file |
//! | `bug-fix` | `fix ... bug` | Reproduce → Diagnose → Fix → Verify |
//! | `feature` | `implement X`, `build ... feature` | Design → Implement → Write tests → Review |
//! | `generic` | anything | Analyze → Plan → Execute → Validate |

use crate::core::error::DomainError;
use crate::task::{SubTask, TaskDefinition};
use regex::{Captures, Regex};
use std::sync::Arc;

/// Generator turning a matched task into sub-tasks
pub type SubTaskGenerator =
    Arc<dyn Fn(&TaskDefinition, &Captures<'_>) -> Vec<SubTask> + Send + Sync>;

/// A named matcher/generator pair
#[derive(Clone)]
pub struct DecompositionPattern {
    pub name: String,
    /// Tested against the lowercased task description
    pub matcher: Regex,
    pub generator: SubTaskGenerator,
}

impl DecompositionPattern {
    pub fn new(name: impl Into<String>, matcher: Regex, generator: SubTaskGenerator) -> Self {
        Self {
            name: name.into(),
            matcher,
            generator,
        }
    }

    /// Compile `pattern` and build a decomposition pattern from it.
    pub fn compile<F>(
        name: impl Into<String>,
        pattern: &str,
        generator: F,
    ) -> Result<Self, DomainError>
    where
        F: Fn(&TaskDefinition, &Captures<'_>) -> Vec<SubTask> + Send + Sync + 'static,
    {
        let name = name.into();
        let matcher = Regex::new(pattern).map_err(|e| DomainError::InvalidPattern {
            name: name.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self::new(name, matcher, Arc::new(generator)))
    }

    /// Run the generator if the matcher accepts the lowercased description.
    pub fn apply(&self, task: &TaskDefinition, normalized: &str) -> Option<Vec<SubTask>> {
        let captures = self.matcher.captures(normalized)?;
        Some((self.generator)(task, &captures))
    }
}

impl std::fmt::Debug for DecompositionPattern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecompositionPattern")
            .field("name", &self.name)
            .field("matcher", &self.matcher.as_str())
            .finish_non_exhaustive()
    }
}

/// `(id suffix, title, description prefix, capability hints)`
type Step = (&'static str, &'static str, &'static str, &'static [&'static str]);

const BUG_FIX_STEPS: &[Step] = &[
    ("reproduce", "Reproduce", "Reproduce the problem", &["testing"]),
    ("diagnose", "Diagnose", "Find the root cause", &["debugging"]),
    ("fix", "Fix", "Implement the fix", &["implementation"]),
    ("verify", "Verify", "Verify the fix and add a regression test", &["testing"]),
];

const FEATURE_STEPS: &[Step] = &[
    ("design", "Design", "Design the approach", &["design", "architecture"]),
    ("implement", "Implement", "Implement", &["implementation"]),
    ("test", "Write tests", "Write tests for", &["testing"]),
    ("review", "Review", "Review the work on", &["review"]),
];

const GENERIC_STEPS: &[Step] = &[
    ("analyze", "Analyze", "Analyze the requirements of", &["analysis"]),
    ("plan", "Plan", "Plan the work for", &["planning"]),
    ("execute", "Execute", "Carry out", &[]),
    ("validate", "Validate", "Validate the result of", &["testing"]),
];

/// Build a linear chain: every step depends on the previous one.
fn chain(task: &TaskDefinition, steps: &[Step]) -> Vec<SubTask> {
    let mut subtasks: Vec<SubTask> = Vec::with_capacity(steps.len());
    for &(suffix, title, prefix, capabilities) in steps {
        let mut subtask = SubTask::of(task, suffix, title, format!("{}: {}", prefix, task.description))
            .with_capabilities(capabilities.iter().copied());
        if let Some(previous) = subtasks.last() {
            subtask = subtask.depends_on(previous.id.clone());
        }
        subtasks.push(subtask);
    }
    subtasks
}

/// File names listed between the first `[` and the following `]` of the
/// original (case-preserving) description.
pub fn bracketed_files(description: &str) -> Vec<String> {
    let Some(open) = description.find('[') else {
        return Vec::new();
    };
    let Some(len) = description[open + 1..].find(']') else {
        return Vec::new();
    };

    description[open + 1..open + 1 + len]
        .split(',')
        .map(|f| f.trim().trim_matches(['"', '\'', '`']).trim())
        .filter(|f| !f.is_empty())
        .map(str::to_string)
        .collect()
}

fn multi_file(task: &TaskDefinition, _captures: &Captures<'_>) -> Vec<SubTask> {
    bracketed_files(&task.description)
        .into_iter()
        .enumerate()
        .map(|(i, file)| {
            SubTask::of(
                task,
                &format!("file-{}", i + 1),
                format!("Update {}", file),
                format!("Apply the change to {}: {}", file, task.description),
            )
        })
        .collect()
}

fn bug_fix(task: &TaskDefinition, _captures: &Captures<'_>) -> Vec<SubTask> {
    chain(task, BUG_FIX_STEPS)
}

fn feature(task: &TaskDefinition, _captures: &Captures<'_>) -> Vec<SubTask> {
    chain(task, FEATURE_STEPS)
}

fn generic(task: &TaskDefinition, _captures: &Captures<'_>) -> Vec<SubTask> {
    chain(task, GENERIC_STEPS)
}

pub const MULTI_FILE_PATTERN: &str =
    r"\b(?:update|modify|refactor|migrate|rename|edit|change)\b[^\[]*\[[^\]]*[^\]\s,][^\]]*\]";
pub const BUG_FIX_PATTERN: &str =
    r"\b(?:fix|resolve|debug)\w*\b.*\b(?:bug|issue|crash|regression|error)s?\b";
pub const FEATURE_PATTERN: &str =
    r"^\s*(?:please\s+)?(?:build|implement)\s+\S|\b(?:build|implement|create|add|develop)\b.*\bfeature\b";
pub const GENERIC_PATTERN: &str = r"(?s).*";

/// Name of the catch-all pattern
pub const GENERIC_PATTERN_NAME: &str = "generic";

fn builtin(
    name: &str,
    pattern: &str,
    generator: fn(&TaskDefinition, &Captures<'_>) -> Vec<SubTask>,
) -> DecompositionPattern {
    // Constant expressions, compiled in test_builtin_patterns_compile
    let matcher = Regex::new(pattern).expect("built-in decomposition pattern");
    DecompositionPattern::new(name, matcher, Arc::new(generator))
}

/// Built-in patterns in match order, ending with the catch-all.
pub fn builtin_patterns() -> Vec<DecompositionPattern> {
    vec![
        builtin("multi-file", MULTI_FILE_PATTERN, multi_file),
        builtin("bug-fix", BUG_FIX_PATTERN, bug_fix),
        builtin("feature", FEATURE_PATTERN, feature),
        builtin(GENERIC_PATTERN_NAME, GENERIC_PATTERN, generic),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(name: &str, description: &str) -> Option<Vec<SubTask>> {
        let task = TaskDefinition::new("t", description);
        builtin_patterns()
            .into_iter()
            .find(|p| p.name == name)
            .and_then(|p| p.apply(&task, &task.normalized_description()))
    }

    #[test]
    fn test_builtin_patterns_compile() {
        let names: Vec<String> = builtin_patterns().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["multi-file", "bug-fix", "feature", "generic"]);
    }

    #[test]
    fn test_feature_chain() {
        let subtasks = run("feature", "Implement user dashboard feature").unwrap();
        let titles: Vec<&str> = subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Design", "Implement", "Write tests", "Review"]);
        assert!(subtasks[0].dependencies.is_empty());
        assert_eq!(subtasks[1].dependencies, vec!["t-design".to_string()]);
        assert_eq!(subtasks[3].dependencies, vec!["t-test".to_string()]);
    }

    #[test]
    fn test_feature_matches_build_feature_phrase() {
        assert!(run("feature", "We should build a search feature").is_some());
        assert!(run("feature", "Write documentation").is_none());
    }

    #[test]
    fn test_bug_fix_chain() {
        let subtasks = run("bug-fix", "Fix the login bug on Safari").unwrap();
        let titles: Vec<&str> = subtasks.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["Reproduce", "Diagnose", "Fix", "Verify"]);
        assert!(subtasks[2].description.contains("Fix the login bug on Safari"));
    }

    #[test]
    fn test_multi_file_emits_independent_subtasks() {
        let subtasks = run(
            "multi-file",
            "Update the license header in [src/Main.rs, `lib/Util.rs`, README.md]",
        )
        .unwrap();

        assert_eq!(subtasks.len(), 3);
        assert!(subtasks.iter().all(|s| s.dependencies.is_empty()));
        // Original casing is preserved
        assert_eq!(subtasks[0].title, "Update src/Main.rs");
        assert_eq!(subtasks[1].title, "Update lib/Util.rs");
    }

    #[test]
    fn test_multi_file_requires_a_name() {
        assert!(run("multi-file", "Update [ , ]").is_none());
    }

    #[test]
    fn test_bracketed_files() {
        assert_eq!(bracketed_files("no list"), Vec::<String>::new());
        assert_eq!(bracketed_files("edit [a.rs,b.rs] and [c.rs]"), vec!["a.rs", "b.rs"]);
        assert_eq!(bracketed_files("unclosed [a.rs"), Vec::<String>::new());
    }

    #[test]
    fn test_compile_rejects_bad_regex() {
        let result = DecompositionPattern::compile("bad", "(unclosed", |_, _| Vec::new());
        assert!(matches!(result, Err(DomainError::InvalidPattern { .. })));
    }
}
