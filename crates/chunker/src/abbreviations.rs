//! Allow-list of abbreviations that must not be mistaken for sentence
//! boundaries during sentence-level splitting.

use once_cell::sync::Lazy;
use std::collections::HashSet;

static ABBREVIATIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "approx", "e.g", "i.e",
        "no", "inc", "ltd", "co", "vol", "fig", "mt", "gen", "capt", "lt", "col", "sgt", "rev",
    ]
    .into_iter()
    .collect()
});

/// Whether `word` (without its trailing period) is a known abbreviation, so
/// a `.` immediately after it should not be treated as a sentence end.
pub fn is_abbreviation(word: &str) -> bool {
    let lower = word.trim_end_matches('.').to_ascii_lowercase();
    ABBREVIATIONS.contains(lower.as_str())
}

/// Whether `word` looks like a decimal number fragment (e.g. the `3` in
/// `3.14`), another case where a `.` is not a sentence boundary.
pub fn is_numeric_fragment(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_abbreviations_case_insensitively() {
        assert!(is_abbreviation("Dr."));
        assert!(is_abbreviation("MR"));
        assert!(!is_abbreviation("sentence"));
    }

    #[test]
    fn recognizes_numeric_fragments() {
        assert!(is_numeric_fragment("3"));
        assert!(!is_numeric_fragment("3a"));
    }
}
