//! Topological layering of dependency graphs into parallel batches.
//!
//! Shared by task decomposition and workflow execution: a batch is the
//! maximal set of not-yet-placed nodes whose dependencies were all placed
//! in strictly earlier batches.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Result of layering a dependency graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layering {
    /// Batches in execution order; ids keep their input order within a batch
    pub batches: Vec<Vec<String>>,
    /// Ids that could not be placed (cycle or missing dependency)
    pub unresolved: Vec<String>,
}

impl Layering {
    /// Whether every node was placed.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Layer `(id, dependencies)` pairs into batches.
///
/// Stops as soon as a pass places nothing, so cycles and references to
/// unknown ids end up in [`Layering::unresolved`] instead of looping.
pub fn layer_by_dependencies<'a, I>(nodes: I) -> Layering
where
    I: IntoIterator<Item = (&'a str, &'a [String])>,
{
    let mut remaining: Vec<(&str, &[String])> = nodes.into_iter().collect();
    let mut placed: HashSet<&str> = HashSet::new();
    let mut layering = Layering::default();

    // Each productive pass places at least one node
    let max_passes = remaining.len();
    for _ in 0..max_passes {
        if remaining.is_empty() {
            break;
        }

        let batch: Vec<&str> = remaining
            .iter()
            .filter(|(_, deps)| deps.iter().all(|d| placed.contains(d.as_str())))
            .map(|(id, _)| *id)
            .collect();

        if batch.is_empty() {
            break;
        }

        placed.extend(batch.iter().copied());
        remaining.retain(|(id, _)| !batch.contains(id));
        layering
            .batches
            .push(batch.into_iter().map(str::to_string).collect());
    }

    layering.unresolved = remaining.into_iter().map(|(id, _)| id.to_string()).collect();
    layering
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(edges: &[(&str, Vec<&str>)]) -> Vec<(String, Vec<String>)> {
        edges
            .iter()
            .map(|(id, deps)| (id.to_string(), deps.iter().map(|d| d.to_string()).collect()))
            .collect()
    }

    fn layer(g: &[(String, Vec<String>)]) -> Layering {
        layer_by_dependencies(g.iter().map(|(id, deps)| (id.as_str(), deps.as_slice())))
    }

    fn batch_of(layering: &Layering, id: &str) -> Option<usize> {
        layering
            .batches
            .iter()
            .position(|batch| batch.iter().any(|b| b == id))
    }

    #[test]
    fn test_linear_chain() {
        let g = graph(&[("a", vec![]), ("b", vec!["a"]), ("c", vec!["b"])]);
        let layering = layer(&g);

        assert_eq!(layering.batches, vec![vec!["a"], vec!["b"], vec!["c"]]);
        assert!(layering.is_complete());
    }

    #[test]
    fn test_diamond() {
        let g = graph(&[
            ("root", vec![]),
            ("left", vec!["root"]),
            ("right", vec!["root"]),
            ("join", vec!["left", "right"]),
        ]);
        let layering = layer(&g);

        assert_eq!(layering.batches.len(), 3);
        assert_eq!(layering.batches[1], vec!["left", "right"]);
        assert_eq!(batch_of(&layering, "join"), Some(2));
    }

    #[test]
    fn test_independent_nodes_share_a_batch() {
        let g = graph(&[("x", vec![]), ("y", vec![]), ("z", vec![])]);
        let layering = layer(&g);
        assert_eq!(layering.batches, vec![vec!["x", "y", "z"]]);
    }

    #[test]
    fn test_cycle_is_reported_not_looped() {
        let g = graph(&[("a", vec![]), ("b", vec!["c"]), ("c", vec!["b"])]);
        let layering = layer(&g);

        assert_eq!(layering.batches, vec![vec!["a"]]);
        assert_eq!(layering.unresolved, vec!["b", "c"]);
        assert!(!layering.is_complete());
    }

    #[test]
    fn test_missing_dependency() {
        let g = graph(&[("a", vec!["ghost"]), ("b", vec![])]);
        let layering = layer(&g);

        assert_eq!(layering.batches, vec![vec!["b"]]);
        assert_eq!(layering.unresolved, vec!["a"]);
    }

    #[test]
    fn test_self_dependency() {
        let g = graph(&[("a", vec!["a"])]);
        let layering = layer(&g);
        assert!(layering.batches.is_empty());
        assert_eq!(layering.unresolved, vec!["a"]);
    }

    #[test]
    fn test_dependencies_always_in_earlier_batches() {
        let g = graph(&[
            ("e", vec!["c", "d"]),
            ("a", vec![]),
            ("d", vec!["b"]),
            ("b", vec!["a"]),
            ("c", vec!["a"]),
        ]);
        let layering = layer(&g);
        assert!(layering.is_complete());

        for (id, deps) in &g {
            let own = batch_of(&layering, id).unwrap();
            for dep in deps {
                assert!(batch_of(&layering, dep).unwrap() < own, "{dep} not before {id}");
            }
        }
    }
}
