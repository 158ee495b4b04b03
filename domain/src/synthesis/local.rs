//! Deterministic synthesis used when the chairman cannot answer.

use super::{SynthesisCandidate, SynthesisStrategy};
use crate::core::string::normalize_claim;
use std::collections::{HashMap, HashSet};

/// Candidates sorted best first: score descending, then response id.
pub fn rank_candidates(candidates: &[SynthesisCandidate]) -> Vec<&SynthesisCandidate> {
    let mut ranked: Vec<&SynthesisCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.response_id.cmp(&b.response_id))
    });
    ranked
}

/// Combine candidates without a chairman. `None` when there are none.
///
/// - best-of-n, debate-resolution: the top candidate verbatim
/// - merge-top: the top `top_k` candidates, separated by blank lines
/// - consensus-filter: lines that a strict majority of candidates contain
///   (compared after normalization), or the top candidate if none do
pub fn local_synthesis(
    strategy: SynthesisStrategy,
    candidates: &[SynthesisCandidate],
    top_k: usize,
) -> Option<String> {
    let ranked = rank_candidates(candidates);
    let best = ranked.first()?;

    let combined = match strategy {
        SynthesisStrategy::BestOfN | SynthesisStrategy::DebateResolution => best.content.clone(),
        SynthesisStrategy::MergeTop => ranked
            .iter()
            .take(top_k.max(1))
            .map(|c| c.content.trim())
            .filter(|c| !c.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n"),
        SynthesisStrategy::ConsensusFilter => {
            majority_lines(&ranked).unwrap_or_else(|| best.content.clone())
        }
    };

    Some(combined)
}

fn majority_lines(ranked: &[&SynthesisCandidate]) -> Option<String> {
    let mut support: HashMap<String, usize> = HashMap::new();
    for candidate in ranked {
        let claims: HashSet<String> = candidate
            .content
            .lines()
            .map(normalize_claim)
            .filter(|c| !c.is_empty())
            .collect();
        for claim in claims {
            *support.entry(claim).or_default() += 1;
        }
    }

    let mut emitted = HashSet::new();
    let kept: Vec<&str> = ranked
        .iter()
        .flat_map(|c| c.content.lines())
        .filter(|line| {
            let claim = normalize_claim(line);
            !claim.is_empty()
                && support.get(&claim).is_some_and(|&n| n * 2 > ranked.len())
                && emitted.insert(claim)
        })
        .map(str::trim)
        .collect();

    (!kept.is_empty()).then(|| kept.join("\n"))
}
