//! Synthesis strategies
//!
//! A consensus level selects how candidate answers are combined into one.
//! The chairman normally performs the combination through a prompt
//! ([`generate_synthesis_prompt`]); [`local_synthesis`] is the
//! deterministic fallback when it cannot.

pub mod local;
pub mod prompt;

pub use local::{local_synthesis, rank_candidates};
pub use prompt::{SynthesisAnswer, generate_synthesis_prompt, parse_synthesis_response};

use crate::ranking::ConsensusLevel;
use serde::{Deserialize, Serialize};

/// How candidate answers are combined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SynthesisStrategy {
    /// Take the highest-scoring answer verbatim
    BestOfN,
    /// Combine the top-k answers into one
    MergeTop,
    /// Keep only claims that a majority of answers make
    ConsensusFilter,
    /// Have an arbiter settle the conflicting top answers
    DebateResolution,
}

impl SynthesisStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SynthesisStrategy::BestOfN => "best-of-n",
            SynthesisStrategy::MergeTop => "merge-top",
            SynthesisStrategy::ConsensusFilter => "consensus-filter",
            SynthesisStrategy::DebateResolution => "debate-resolution",
        }
    }

    /// Instruction given to the chairman for this strategy
    pub fn instruction(&self) -> &'static str {
        match self {
            SynthesisStrategy::BestOfN => {
                "The reviewers agree. Present the highest-ranked response as the final answer, \
                 correcting only clear mistakes."
            }
            SynthesisStrategy::MergeTop => {
                "The reviewers mostly agree. Merge the strongest points of the top-ranked \
                 responses into one coherent answer without repeating yourself."
            }
            SynthesisStrategy::ConsensusFilter => {
                "The reviewers only weakly agree. Keep only the claims that a majority of the \
                 responses support and drop everything that is contested."
            }
            SynthesisStrategy::DebateResolution => {
                "The reviewers are split. Act as arbiter: weigh the conflicting responses \
                 against each other, decide which position is better supported, and explain why."
            }
        }
    }
}

impl std::fmt::Display for SynthesisStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SynthesisStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "best-of-n" => Ok(SynthesisStrategy::BestOfN),
            "merge-top" => Ok(SynthesisStrategy::MergeTop),
            "consensus-filter" => Ok(SynthesisStrategy::ConsensusFilter),
            "debate-resolution" => Ok(SynthesisStrategy::DebateResolution),
            _ => Err(format!(
                "Unknown synthesis strategy: {}. Valid: best-of-n, merge-top, consensus-filter, debate-resolution",
                s
            )),
        }
    }
}

/// Strategy for a consensus level.
pub fn select_strategy(level: ConsensusLevel) -> SynthesisStrategy {
    match level {
        ConsensusLevel::Unanimous | ConsensusLevel::Strong => SynthesisStrategy::BestOfN,
        ConsensusLevel::Moderate => SynthesisStrategy::MergeTop,
        ConsensusLevel::Weak => SynthesisStrategy::ConsensusFilter,
        ConsensusLevel::Split => SynthesisStrategy::DebateResolution,
    }
}

/// A candidate answer with its aggregated peer score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisCandidate {
    pub response_id: String,
    pub content: String,
    /// Mean peer score, 0 when nobody ranked it
    pub score: f64,
}

impl SynthesisCandidate {
    pub fn new(response_id: impl Into<String>, content: impl Into<String>, score: f64) -> Self {
        Self {
            response_id: response_id.into(),
            content: content.into(),
            score,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_strategy_total() {
        let expected = [
            (ConsensusLevel::Unanimous, SynthesisStrategy::BestOfN),
            (ConsensusLevel::Strong, SynthesisStrategy::BestOfN),
            (ConsensusLevel::Moderate, SynthesisStrategy::MergeTop),
            (ConsensusLevel::Weak, SynthesisStrategy::ConsensusFilter),
            (ConsensusLevel::Split, SynthesisStrategy::DebateResolution),
        ];
        for (level, strategy) in expected {
            assert_eq!(select_strategy(level), strategy, "{level}");
        }
        // Deterministic
        for level in ConsensusLevel::all() {
            assert_eq!(select_strategy(level), select_strategy(level));
        }
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(
            "merge_top".parse::<SynthesisStrategy>().unwrap(),
            SynthesisStrategy::MergeTop
        );
        assert_eq!(SynthesisStrategy::BestOfN.to_string(), "best-of-n");
        assert!("vote".parse::<SynthesisStrategy>().is_err());
    }
}
