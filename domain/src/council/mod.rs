//! Council deliberation model
//!
//! A council answers a task in three stages: every member responds
//! independently, every member ranks the anonymized responses, and a
//! chairman synthesizes the final answer. The async protocol lives in the
//! application layer; this module holds its value objects and prompts.

pub mod prompt;
pub mod value_objects;

pub use prompt::CouncilPrompt;
pub use value_objects::{
    ChairmanSynthesis, CouncilResult, MemberRanking, MemberResponse, anonymous_id, candidates_from,
    select_chairman,
};

use serde::{Deserialize, Serialize};

/// Council stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CouncilStage {
    Respond,
    Rank,
    Synthesize,
}

impl CouncilStage {
    pub fn number(&self) -> u8 {
        match self {
            CouncilStage::Respond => 1,
            CouncilStage::Rank => 2,
            CouncilStage::Synthesize => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CouncilStage::Respond => "respond",
            CouncilStage::Rank => "rank",
            CouncilStage::Synthesize => "synthesize",
        }
    }
}

impl std::fmt::Display for CouncilStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
