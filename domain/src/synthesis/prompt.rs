//! Chairman synthesis prompt and reply parsing.

use super::{SynthesisCandidate, SynthesisStrategy, rank_candidates};
use crate::ranking::ConflictEntry;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Structured chairman reply
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SynthesisAnswer {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
}

/// Build the instruction sent to the chairman.
///
/// Candidates are listed best first; conflicts, when any, are listed so the
/// chairman can address them.
pub fn generate_synthesis_prompt(
    strategy: SynthesisStrategy,
    task: &str,
    candidates: &[SynthesisCandidate],
    conflicts: &[ConflictEntry],
) -> String {
    let mut prompt = format!(
        r#"You are the chairman of a council that answered the following task:

{}

Strategy: {}
{}

Candidate responses, best ranked first:
"#,
        task,
        strategy,
        strategy.instruction()
    );

    for candidate in rank_candidates(candidates) {
        prompt.push_str(&format!(
            "\n--- Response {} (score {:.1}/10) ---\n{}\n",
            candidate.response_id, candidate.score, candidate.content
        ));
    }

    if !conflicts.is_empty() {
        prompt.push_str("\nReviewers disagreed on:\n");
        for conflict in conflicts {
            prompt.push_str(&format!(
                "- Response {}: ranked between {} and {} ({} conflict)\n",
                conflict.response_id, conflict.min_rank, conflict.max_rank, conflict.severity
            ));
        }
    }

    prompt.push_str(
        r#"
Reply in exactly this format:

FINAL ANSWER: <the synthesized answer>
RATIONALE: <why this answer, in a few sentences>
KEY POINTS:
- <point>
- <point>"#,
    );

    prompt
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Answer,
    Rationale,
    KeyPoints,
}

static SECTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^[\s#*]*(final answer|rationale|key points)\s*(?:\*\*)?\s*:\s*(?:\*\*)?\s*(.*)$")
        .expect("synthesis section pattern")
});

/// Split a chairman reply into answer, rationale and key points.
///
/// Markers are `FINAL ANSWER:`, `RATIONALE:` and `KEY POINTS:`
/// (case-insensitive, markdown decoration allowed). Without a
/// `FINAL ANSWER:` section, the unmarked text is the answer; with no
/// markers at all the whole reply is.
pub fn parse_synthesis_response(text: &str) -> SynthesisAnswer {
    let mut sections: Vec<(Section, Vec<&str>)> = vec![(Section::Preamble, Vec::new())];

    for line in text.lines() {
        if let Some(caps) = SECTION_MARKER.captures(line) {
            let section = match caps[1].to_lowercase().as_str() {
                "final answer" => Section::Answer,
                "rationale" => Section::Rationale,
                _ => Section::KeyPoints,
            };
            let rest = caps.get(2).map_or("", |m| m.as_str());
            sections.push((section, vec![rest]));
        } else if let Some((_, lines)) = sections.last_mut() {
            lines.push(line);
        }
    }

    let collect = |wanted: Section| -> Option<String> {
        let joined = sections
            .iter()
            .filter(|(s, _)| *s == wanted)
            .map(|(_, lines)| lines.join("\n"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    };

    let answer = collect(Section::Answer)
        .or_else(|| collect(Section::Preamble))
        .unwrap_or_else(|| text.trim().to_string());

    let key_points = collect(Section::KeyPoints)
        .map(|block| {
            block
                .lines()
                .map(|l| l.trim().trim_start_matches(['-', '*', '•']).trim())
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    SynthesisAnswer {
        answer,
        rationale: collect(Section::Rationale),
        key_points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ranking::ConflictSeverity;

    #[test]
    fn test_prompt_lists_candidates_best_first() {
        let candidates = vec![
            SynthesisCandidate::new("A", "answer a", 4.0),
            SynthesisCandidate::new("B", "answer b", 9.0),
        ];
        let conflicts = vec![ConflictEntry {
            response_id: "A".to_string(),
            min_rank: 1,
            max_rank: 4,
            spread: 3,
            severity: ConflictSeverity::High,
        }];

        let prompt =
            generate_synthesis_prompt(SynthesisStrategy::MergeTop, "Explain CRDTs", &candidates, &conflicts);

        assert!(prompt.contains("Explain CRDTs"));
        assert!(prompt.contains("merge-top"));
        let b = prompt.find("Response B").unwrap();
        let a = prompt.find("Response A").unwrap();
        assert!(b < a);
        assert!(prompt.contains("high conflict"));
        assert!(prompt.contains("FINAL ANSWER:"));
    }

    #[test]
    fn test_parse_marked_reply() {
        let reply = "Sure.\n\
                     FINAL ANSWER: Use a CRDT.\n\
                     It merges without coordination.\n\
                     RATIONALE: Three of four responses agree.\n\
                     KEY POINTS:\n\
                     - Convergence\n\
                     * No locking\n";
        let parsed = parse_synthesis_response(reply);

        assert_eq!(parsed.answer, "Use a CRDT.\nIt merges without coordination.");
        assert_eq!(parsed.rationale.as_deref(), Some("Three of four responses agree."));
        assert_eq!(parsed.key_points, vec!["Convergence", "No locking"]);
    }

    #[test]
    fn test_parse_markdown_markers() {
        let reply = "## Final Answer:\nUse Raft\n**Rationale:** simpler";
        let parsed = parse_synthesis_response(reply);
        assert_eq!(parsed.answer, "Use Raft");
        assert_eq!(parsed.rationale.as_deref(), Some("simpler"));
    }

    #[test]
    fn test_parse_unmarked_reply() {
        let parsed = parse_synthesis_response("  Just use Postgres.  ");
        assert_eq!(parsed.answer, "Just use Postgres.");
        assert_eq!(parsed.rationale, None);
        assert!(parsed.key_points.is_empty());
    }

    #[test]
    fn test_parse_rationale_without_answer_marker() {
        let parsed = parse_synthesis_response("Use SQLite\nRATIONALE: embedded");
        assert_eq!(parsed.answer, "Use SQLite");
        assert_eq!(parsed.rationale.as_deref(), Some("embedded"));
    }
}
