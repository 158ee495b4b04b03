//! Peer ranking of candidate answers
//!
//! Pure functions that parse reviewer rankings, aggregate them, detect
//! disagreement and derive a [`ConsensusLevel`].
//!
//! # Functions
//!
//! | Function | Input | Output |
//! |----------|-------|--------|
//! | [`parse_ranking_text`] | one reviewer's reply | `Vec<RankingEntry>` |
//! | [`aggregate_rankings`] | all entries | mean score per response |
//! | [`detect_conflicts`] | all entries | rank spread per response |
//! | [`normalize_scores`] | score map | min-max scaled map |
//! | [`determine_consensus`] | entries per reviewer | [`ConsensusLevel`] |

pub mod aggregate;
pub mod parsing;

pub use aggregate::{
    aggregate_rankings, detect_conflicts, determine_consensus, normalize_scores, top_choice,
};
pub use parsing::parse_ranking_text;

use serde::{Deserialize, Serialize};

/// One reviewer's judgement of one response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    /// Anonymous response id (e.g. "A")
    pub response_id: String,
    /// 1 = best
    pub rank: u32,
    /// 0 to 10
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl RankingEntry {
    pub fn new(response_id: impl Into<String>, rank: u32, score: f64) -> Self {
        Self {
            response_id: response_id.into(),
            rank,
            score: score.clamp(0.0, 10.0),
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// How strongly reviewers disagree on a response's rank
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictSeverity {
    Low,
    Medium,
    High,
}

impl ConflictSeverity {
    /// Severity for a rank spread; `None` when reviewers agree.
    ///
    /// | Spread | Severity |
    /// |--------|----------|
    /// | 0 | none |
    /// | 1 | low |
    /// | 2 | medium |
    /// | 3+ | high |
    pub fn from_spread(spread: u32) -> Option<Self> {
        match spread {
            0 => None,
            1 => Some(ConflictSeverity::Low),
            2 => Some(ConflictSeverity::Medium),
            _ => Some(ConflictSeverity::High),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictSeverity::Low => "low",
            ConflictSeverity::Medium => "medium",
            ConflictSeverity::High => "high",
        }
    }
}

impl std::fmt::Display for ConflictSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rank disagreement on one response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictEntry {
    pub response_id: String,
    pub min_rank: u32,
    pub max_rank: u32,
    pub spread: u32,
    pub severity: ConflictSeverity,
}

/// Qualitative agreement among reviewers' top choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusLevel {
    /// Every reviewer picked the same response
    Unanimous,
    /// At least three quarters agree
    Strong,
    /// A strict majority agrees
    Moderate,
    /// A unique plurality without a majority
    Weak,
    /// Tied leaders, or nobody ranked anything
    Split,
}

impl ConsensusLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsensusLevel::Unanimous => "unanimous",
            ConsensusLevel::Strong => "strong",
            ConsensusLevel::Moderate => "moderate",
            ConsensusLevel::Weak => "weak",
            ConsensusLevel::Split => "split",
        }
    }

    pub fn all() -> [ConsensusLevel; 5] {
        [
            ConsensusLevel::Unanimous,
            ConsensusLevel::Strong,
            ConsensusLevel::Moderate,
            ConsensusLevel::Weak,
            ConsensusLevel::Split,
        ]
    }
}

impl std::fmt::Display for ConsensusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ConsensusLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "unanimous" => Ok(ConsensusLevel::Unanimous),
            "strong" => Ok(ConsensusLevel::Strong),
            "moderate" => Ok(ConsensusLevel::Moderate),
            "weak" => Ok(ConsensusLevel::Weak),
            "split" => Ok(ConsensusLevel::Split),
            _ => Err(format!(
                "Unknown consensus level: {}. Valid: unanimous, strong, moderate, weak, split",
                s
            )),
        }
    }
}
