//! Aggregation over reviewer rankings.

use super::{ConflictEntry, ConflictSeverity, ConsensusLevel, RankingEntry};
use std::collections::BTreeMap;

/// Mean score per response id across every reviewer that ranked it.
pub fn aggregate_rankings(entries: &[RankingEntry]) -> BTreeMap<String, f64> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for entry in entries {
        let slot = sums.entry(entry.response_id.clone()).or_insert((0.0, 0));
        slot.0 += entry.score;
        slot.1 += 1;
    }

    sums.into_iter()
        .map(|(id, (sum, count))| (id, sum / count as f64))
        .collect()
}

/// Rank spread per response; responses every reviewer ranked the same
/// produce no entry. Sorted by response id.
pub fn detect_conflicts(entries: &[RankingEntry]) -> Vec<ConflictEntry> {
    let mut bounds: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for entry in entries {
        let slot = bounds
            .entry(entry.response_id.as_str())
            .or_insert((entry.rank, entry.rank));
        slot.0 = slot.0.min(entry.rank);
        slot.1 = slot.1.max(entry.rank);
    }

    bounds
        .into_iter()
        .filter_map(|(id, (min_rank, max_rank))| {
            let spread = max_rank - min_rank;
            ConflictSeverity::from_spread(spread).map(|severity| ConflictEntry {
                response_id: id.to_string(),
                min_rank,
                max_rank,
                spread,
                severity,
            })
        })
        .collect()
}

/// Min-max normalize to `[0, 1]`. When every value is equal (including a
/// single value) each entry maps to 0.5.
pub fn normalize_scores(scores: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let min = scores.values().copied().fold(f64::INFINITY, f64::min);
    let max = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;

    scores
        .iter()
        .map(|(id, &score)| {
            let normalized = if range > f64::EPSILON {
                (score - min) / range
            } else {
                0.5
            };
            (id.clone(), normalized)
        })
        .collect()
}

/// A reviewer's favourite: lowest rank, then highest score, then smallest id.
pub fn top_choice(entries: &[RankingEntry]) -> Option<&RankingEntry> {
    entries.iter().min_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then(b.score.total_cmp(&a.score))
            .then(a.response_id.cmp(&b.response_id))
    })
}

/// Consensus level from each reviewer's top choice.
///
/// Reviewers with no entries are ignored. With `ratio` = votes for the
/// leading response / reviewers:
///
/// | Condition | Level |
/// |-----------|-------|
/// | ratio = 1 | unanimous |
/// | ratio ≥ 0.75 | strong |
/// | ratio > 0.5 | moderate |
/// | unique leader | weak |
/// | tied leaders, no reviewers | split |
pub fn determine_consensus(rankings: &[Vec<RankingEntry>]) -> ConsensusLevel {
    let mut votes: BTreeMap<&str, usize> = BTreeMap::new();
    let mut reviewers = 0usize;
    for entries in rankings {
        if let Some(top) = top_choice(entries) {
            *votes.entry(top.response_id.as_str()).or_default() += 1;
            reviewers += 1;
        }
    }

    let Some(&leader) = votes.values().max() else {
        return ConsensusLevel::Split;
    };
    let leaders = votes.values().filter(|&&v| v == leader).count();
    let ratio = leader as f64 / reviewers as f64;

    if leader == reviewers {
        ConsensusLevel::Unanimous
    } else if ratio >= 0.75 {
        ConsensusLevel::Strong
    } else if ratio > 0.5 {
        ConsensusLevel::Moderate
    } else if leaders == 1 {
        ConsensusLevel::Weak
    } else {
        ConsensusLevel::Split
    }
}
