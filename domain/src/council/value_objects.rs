//! Council value objects: what each stage produced.

use crate::ranking::{ConflictEntry, ConsensusLevel, RankingEntry};
use crate::synthesis::{SynthesisAnswer, SynthesisCandidate, SynthesisStrategy};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Anonymous label for the `index`-th usable response: A..Z, then AA, AB, ...
pub fn anonymous_id(index: usize) -> String {
    let mut n = index;
    let mut label = Vec::new();
    loop {
        label.push(b'A' + (n % 26) as u8);
        if n < 26 {
            break;
        }
        n = n / 26 - 1;
    }
    label.reverse();
    String::from_utf8_lossy(&label).into_owned()
}

/// Stage 1: one member's independent answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberResponse {
    pub member_id: String,
    /// Anonymous id, set only for usable responses
    pub response_id: Option<String>,
    pub content: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl MemberResponse {
    pub fn success(member_id: impl Into<String>, content: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            member_id: member_id.into(),
            response_id: None,
            content: Some(content.into()),
            error: None,
            duration_ms,
        }
    }

    pub fn failure(member_id: impl Into<String>, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            member_id: member_id.into(),
            response_id: None,
            content: None,
            error: Some(error.into()),
            duration_ms,
        }
    }

    /// Has non-empty content
    pub fn is_usable(&self) -> bool {
        self.content.as_deref().is_some_and(|c| !c.trim().is_empty())
    }
}

/// Stage 2: one member's ranking of the anonymized responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRanking {
    pub member_id: String,
    /// Empty when the member failed or its reply had no ranking lines
    pub entries: Vec<RankingEntry>,
    pub error: Option<String>,
}

impl MemberRanking {
    pub fn parsed(member_id: impl Into<String>, entries: Vec<RankingEntry>) -> Self {
        let error = entries
            .is_empty()
            .then(|| "no ranking lines found in reply".to_string());
        Self {
            member_id: member_id.into(),
            entries,
            error,
        }
    }

    pub fn absent(member_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            member_id: member_id.into(),
            entries: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_present(&self) -> bool {
        !self.entries.is_empty()
    }
}

/// Stage 3: the chairman's synthesis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChairmanSynthesis {
    pub chairman_id: String,
    pub strategy: SynthesisStrategy,
    pub answer: SynthesisAnswer,
    /// The chairman failed and the answer was combined locally
    pub fallback: bool,
    pub error: Option<String>,
}

/// Outcome of one deliberation. Not mutated after it is returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilResult {
    pub task_id: String,
    pub stage1: Vec<MemberResponse>,
    pub stage2: Vec<MemberRanking>,
    pub stage3: ChairmanSynthesis,
    /// Mean peer score per anonymous response id
    pub aggregated: BTreeMap<String, f64>,
    pub conflicts: Vec<ConflictEntry>,
    pub consensus: ConsensusLevel,
    pub final_answer: String,
}

impl CouncilResult {
    pub fn usable_responses(&self) -> impl Iterator<Item = &MemberResponse> {
        self.stage1.iter().filter(|r| r.is_usable())
    }

    /// Stage-1 response by anonymous id
    pub fn response(&self, response_id: &str) -> Option<&MemberResponse> {
        self.stage1
            .iter()
            .find(|r| r.response_id.as_deref() == Some(response_id))
    }

    pub fn failed_members(&self) -> Vec<&str> {
        self.stage1
            .iter()
            .filter(|r| !r.is_usable())
            .map(|r| r.member_id.as_str())
            .collect()
    }
}

/// Synthesis candidates from the usable responses and their scores.
pub fn candidates_from(
    responses: &[MemberResponse],
    aggregated: &BTreeMap<String, f64>,
) -> Vec<SynthesisCandidate> {
    responses
        .iter()
        .filter_map(|r| {
            let id = r.response_id.as_ref()?;
            let content = r.content.as_ref()?;
            let score = aggregated.get(id).copied().unwrap_or(0.0);
            Some(SynthesisCandidate::new(id.clone(), content.clone(), score))
        })
        .collect()
}

/// Member whose response scored best; first usable responder when nothing
/// was ranked. Ties go to the earlier response.
pub fn select_chairman<'a>(
    responses: &'a [MemberResponse],
    aggregated: &BTreeMap<String, f64>,
) -> Option<&'a str> {
    let mut best: Option<(&MemberResponse, f64)> = None;
    for response in responses.iter().filter(|r| r.is_usable()) {
        let score = response
            .response_id
            .as_ref()
            .and_then(|id| aggregated.get(id))
            .copied()
            .unwrap_or(f64::NEG_INFINITY);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((response, score));
        }
    }
    best.map(|(r, _)| r.member_id.as_str())
}
