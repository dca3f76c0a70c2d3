//! Matching AI results back to the words that were sent.

/// Normalized form used to compare words: all whitespace removed, lowercased.
pub fn normalize_word(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
