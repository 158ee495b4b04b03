//! Ranking reply parsing.
//!
//! Reviewers answer with one line per response:
//!
//! ```text
//! 1. Response B (Score: 9/10) - Complete and well tested
//! 2. Response A (Score: 6/10) - Misses the edge cases
//! ```

use super::RankingEntry;
use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

static RANKING_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?im)^[\s>*\-+#]*(?:\*\*)?(\d+)\s*[.):]\s*(?:\*\*)?\s*response\s+([a-z0-9_]+)\s*(?:\*\*)?\s*\(\s*score\s*:\s*(-?\d+(?:\.\d+)?)\s*(?:/\s*10)?\s*\)(?:\s*[-:\x{2013}\x{2014}]\s*(.*?))?\s*$",
    )
    .expect("ranking line pattern")
});

/// Extract ranking entries from a reviewer's reply.
///
/// Tolerates leading whitespace, markdown bullets and bold markers, and a
/// missing note. Response ids are uppercased; scores are clamped to
/// `[0, 10]`. When an id appears more than once, the first line wins.
/// Entries are returned sorted by rank.
///
/// # Examples
///
/// ```
/// use conclave_domain::ranking::parse_ranking_text;
///
/// let entries = parse_ranking_text("1. Response B (Score: 9/10) - clear\n2. Response A (Score: 4/10)");
/// assert_eq!(entries.len(), 2);
/// assert_eq!(entries[0].response_id, "B");
/// assert_eq!(entries[1].note, None);
/// ```
pub fn parse_ranking_text(text: &str) -> Vec<RankingEntry> {
    let mut seen = HashSet::new();
    let mut entries: Vec<RankingEntry> = RANKING_LINE
        .captures_iter(text)
        .filter_map(|caps| {
            let rank = caps.get(1)?.as_str().parse::<u32>().ok()?;
            let id = caps.get(2)?.as_str().to_uppercase();
            let score = caps.get(3)?.as_str().parse::<f64>().ok()?;
            let note = caps
                .get(4)
                .map(|m| m.as_str().trim())
                .filter(|n| !n.is_empty())
                .map(str::to_string);

            let mut entry = RankingEntry::new(id, rank, score);
            entry.note = note;
            Some(entry)
        })
        .filter(|entry| seen.insert(entry.response_id.clone()))
        .collect();

    entries.sort_by_key(|e| e.rank);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_format() {
        let text = "Here is my ranking:\n\
                    1. Response B (Score: 9/10) - Complete and well tested\n\
                    2. Response A (Score: 6/10) - Misses the edge cases\n";
        let entries = parse_ranking_text(text);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].response_id, "B");
        assert_eq!(entries[0].rank, 1);
        assert_eq!(entries[0].score, 9.0);
        assert_eq!(entries[0].note.as_deref(), Some("Complete and well tested"));
        assert_eq!(entries[1].response_id, "A");
    }

    #[test]
    fn test_parse_tolerates_markdown() {
        let text = "  - **1. Response c** (Score: 7.5/10): solid\n* 2) Response a (score: 3/10)";
        let entries = parse_ranking_text(text);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].response_id, "C");
        assert_eq!(entries[0].score, 7.5);
        assert_eq!(entries[0].note.as_deref(), Some("solid"));
        assert_eq!(entries[1].response_id, "A");
        assert_eq!(entries[1].note, None);
    }

    #[test]
    fn test_parse_sorts_by_rank_and_clamps() {
        let text = "2. Response A (Score: 12/10)\n1. Response B (Score: -1/10)";
        let entries = parse_ranking_text(text);

        assert_eq!(entries[0].response_id, "B");
        assert_eq!(entries[0].score, 0.0);
        assert_eq!(entries[1].score, 10.0);
    }

    #[test]
    fn test_parse_first_duplicate_wins() {
        let text = "1. Response A (Score: 8/10)\n2. Response A (Score: 2/10)";
        let entries = parse_ranking_text(text);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].score, 8.0);
    }

    #[test]
    fn test_parse_garbage() {
        assert!(parse_ranking_text("").is_empty());
        assert!(parse_ranking_text("I liked A best, then B.").is_empty());
    }
}
