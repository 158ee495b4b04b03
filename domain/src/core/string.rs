//! String utilities for the domain layer.

/// Normalize a line of free text for comparison: lowercase, strip list
/// markers and punctuation at the edges, collapse whitespace.
pub fn normalize_claim(line: &str) -> String {
    let trimmed = line
        .trim()
        .trim_start_matches(['-', '*', '•', '>'])
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')')
        .trim()
        .trim_end_matches(['.', '!', ';', ',']);

    trimmed
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Count how many of `needles` occur in `haystack` (case-insensitive).
///
/// `haystack` is expected to be lowercased already; needles are lowercased
/// here. Empty needles never match.
pub fn count_keyword_hits<'a>(haystack: &str, needles: impl IntoIterator<Item = &'a String>) -> u32 {
    needles
        .into_iter()
        .filter(|n| !n.trim().is_empty())
        .filter(|n| haystack.contains(&n.trim().to_lowercase()))
        .count() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_claim() {
        assert_eq!(normalize_claim("- Use a  Mutex."), "use a mutex");
        assert_eq!(normalize_claim("2. Use a mutex"), "use a mutex");
        assert_eq!(normalize_claim("   "), "");
    }

    #[test]
    fn test_count_keyword_hits() {
        let keywords = vec!["Rust".to_string(), "tokio".to_string(), "".to_string()];
        assert_eq!(count_keyword_hits("a rust service on tokio", &keywords), 2);
        assert_eq!(count_keyword_hits("python script", &keywords), 0);
    }
}
