//! Task complexity heuristic.

use crate::task::{Priority, TaskDefinition};

/// Keywords that signal a harder task. Each distinct hit counts once.
pub const COMPLEXITY_INDICATORS: &[&str] = &[
    "distributed",
    "concurrent",
    "migration",
    "real-time",
    "realtime",
    "security",
    "scalab",
    "performance",
    "integration",
    "authentication",
    "encryption",
];

/// Description length (bytes) worth one point, capped at [`MAX_LENGTH_POINTS`]
const CHARS_PER_POINT: usize = 80;
const MAX_LENGTH_POINTS: usize = 3;
const INDICATOR_WEIGHT: usize = 2;

fn priority_bonus(priority: Priority) -> usize {
    match priority {
        Priority::Critical => 3,
        Priority::High => 2,
        Priority::Medium | Priority::Low => 0,
    }
}

/// Number of distinct complexity indicators in the description.
pub fn indicator_count(task: &TaskDefinition) -> usize {
    let description = task.normalized_description();
    COMPLEXITY_INDICATORS
        .iter()
        .filter(|kw| description.contains(*kw))
        .count()
}

/// Score a task's complexity on a 1-10 scale.
///
/// `1 + min(len / 80, 3) + 2 × indicators + priority bonus`, clamped.
/// Monotonic: more indicators, a longer description or a higher priority
/// never lower the score.
pub fn calculate_complexity(task: &TaskDefinition) -> u8 {
    let length_points = (task.description.len() / CHARS_PER_POINT).min(MAX_LENGTH_POINTS);
    let raw = 1
        + length_points
        + INDICATOR_WEIGHT * indicator_count(task)
        + priority_bonus(task.priority);

    raw.clamp(1, 10) as u8
}
