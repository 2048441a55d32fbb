//! Three-level split cascade: paragraph, then sentence, then clause.
//!
//! Each level only engages once the level above it still leaves a unit
//! over the backend's `max_words` ceiling. Units are packed greedily into
//! chunks targeting `optimal_words`; packing never merges past `max_words`
//! because every unit handed to [`pack_units`] is already verified to fit.

use once_cell::sync::Lazy;
use regex::Regex;
use tts_gateway_core::error::GatewayError;

use crate::{abbreviations, ChunkerConfig};

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n+").unwrap());

/// Collapse all whitespace runs (including newlines) to single spaces and
/// trim the ends. The content-preservation invariant is stated in terms of
/// this normalized form, not the raw input.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text)
        .map(normalize_whitespace)
        .filter(|p| !p.is_empty())
        .collect()
}

/// Split `paragraph` (already whitespace-normalized) into sentences, using
/// terminal punctuation followed by an uppercase letter as the boundary
/// signal, unless the preceding word is a known abbreviation or a bare
/// digit fragment.
fn split_sentences(paragraph: &str) -> Vec<String> {
    let words: Vec<&str> = paragraph.split_whitespace().collect();
    let mut sentences = Vec::new();
    let mut current = String::new();

    for (i, word) in words.iter().enumerate() {
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);

        let ends_sentence = word.ends_with(['.', '!', '?', '…']);
        if !ends_sentence {
            continue;
        }

        let stem = word.trim_end_matches(['.', '!', '?', '…']);
        if abbreviations::is_abbreviation(word) || abbreviations::is_numeric_fragment(stem) {
            continue;
        }

        let next_starts_upper = words
            .get(i + 1)
            .and_then(|w| w.chars().next())
            .map(|c| c.is_uppercase())
            .unwrap_or(true);

        if next_starts_upper {
            sentences.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        sentences.push(current);
    }
    sentences
}

/// Whether `unit` already respects both of the backend's ceilings.
fn fits(unit: &str, max_words: usize, max_chars: usize) -> bool {
    unit.split_whitespace().count() <= max_words && unit.chars().count() <= max_chars
}

/// Split an oversized `sentence` at clause delimiters (`;`, `:`, em dash),
/// falling back to the comma nearest the midpoint. Recurses on whichever
/// half still violates `max_words` or `max_chars`; fails once no further
/// delimiter exists.
fn split_clauses(sentence: &str, max_words: usize, max_chars: usize) -> Result<Vec<String>, GatewayError> {
    if fits(sentence, max_words, max_chars) {
        return Ok(vec![sentence.to_string()]);
    }

    let parts = split_on_delimiters(sentence, &[';', ':', '—'])
        .or_else(|| split_on_nearest_comma(sentence));

    let Some(parts) = parts else {
        let word_count = sentence.split_whitespace().count();
        let char_count = sentence.chars().count();
        return Err(GatewayError::ChunkTooLarge(format!(
            "a {word_count}-word/{char_count}-char sentence has no clause boundary to split on (limits {max_words} words, {max_chars} chars)"
        )));
    };

    let mut out = Vec::new();
    for part in parts {
        out.extend(split_clauses(&part, max_words, max_chars)?);
    }
    Ok(out)
}

fn split_on_delimiters(sentence: &str, delims: &[char]) -> Option<Vec<String>> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut split_count = 0;

    for ch in sentence.chars() {
        current.push(ch);
        if delims.contains(&ch) {
            let trimmed = current.trim().to_string();
            if !trimmed.is_empty() {
                parts.push(trimmed);
                split_count += 1;
            }
            current = String::new();
        }
    }
    let tail = current.trim().to_string();
    if !tail.is_empty() {
        parts.push(tail);
    }

    if split_count > 0 && parts.len() > 1 {
        Some(parts)
    } else {
        None
    }
}

fn split_on_nearest_comma(sentence: &str) -> Option<Vec<String>> {
    let chars: Vec<char> = sentence.chars().collect();
    let midpoint = chars.len() / 2;
    let comma_index = chars
        .iter()
        .enumerate()
        .filter(|(_, c)| **c == ',')
        .min_by_key(|(i, _)| (*i as i64 - midpoint as i64).abs())
        .map(|(i, _)| i)?;

    let left: String = chars[..=comma_index].iter().collect();
    let right: String = chars[comma_index + 1..].iter().collect();
    let left = left.trim().to_string();
    let right = right.trim().to_string();

    if left.is_empty() || right.is_empty() {
        None
    } else {
        Some(vec![left, right])
    }
}

/// Greedily join units (each already within `max_words`/`max_chars`) into
/// chunks targeting `optimal_words`, never exceeding either ceiling once a
/// chunk is non-empty.
fn pack_units(units: Vec<String>, optimal_words: usize, max_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_words = 0usize;

    for unit in units {
        let unit_words = unit.split_whitespace().count();
        if current.is_empty() {
            current = unit;
            current_words = unit_words;
        } else if current_words + unit_words <= optimal_words
            && current.chars().count() + 1 + unit.chars().count() <= max_chars
        {
            current.push(' ');
            current.push_str(&unit);
            current_words += unit_words;
        } else {
            chunks.push(std::mem::take(&mut current));
            current = unit;
            current_words = unit_words;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

pub fn split_into_chunks(text: &str, config: &ChunkerConfig) -> Result<Vec<String>, GatewayError> {
    let mut units = Vec::new();
    for paragraph in split_paragraphs(text) {
        for sentence in split_sentences(&paragraph) {
            if fits(&sentence, config.max_words, config.max_chars) {
                units.push(sentence);
            } else {
                units.extend(split_clauses(&sentence, config.max_words, config.max_chars)?);
            }
        }
    }
    Ok(pack_units(units, config.optimal_words, config.max_chars))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_newlines_and_runs_of_spaces() {
        assert_eq!(normalize_whitespace("a\n\n  b   c\t\td"), "a b c d");
    }

    #[test]
    fn paragraph_split_respects_blank_lines() {
        let text = "First paragraph.\n\nSecond paragraph.";
        let paras = split_paragraphs(text);
        assert_eq!(paras, vec!["First paragraph.", "Second paragraph."]);
    }

    #[test]
    fn sentence_split_ignores_abbreviations() {
        let sentences = split_sentences("Dr. Smith left. He came back.");
        assert_eq!(sentences, vec!["Dr. Smith left.", "He came back."]);
    }

    #[test]
    fn clause_split_prefers_semicolon_over_comma() {
        let sentence = "one two three four five; six seven eight nine ten eleven twelve";
        let parts = split_on_delimiters(sentence, &[';', ':', '—']).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].ends_with(';'));
    }

    #[test]
    fn comma_split_picks_nearest_midpoint_comma() {
        let sentence = "a, b c d e f g h i j k l m n, o";
        let parts = split_on_nearest_comma(sentence).unwrap();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].len() > 3);
    }

    #[test]
    fn pack_units_respects_optimal_target() {
        let units = vec!["a b c".to_string(), "d e f".to_string(), "g h i".to_string()];
        let chunks = pack_units(units, 6, 1000);
        assert_eq!(chunks, vec!["a b c d e f".to_string(), "g h i".to_string()]);
    }

    #[test]
    fn pack_units_respects_max_chars_even_under_the_word_ceiling() {
        let units = vec!["a b c".to_string(), "d e f".to_string()];
        // Word ceiling alone would merge both units (3 + 3 <= 20), but the
        // char ceiling forbids it.
        let chunks = pack_units(units, 20, 8);
        assert_eq!(chunks, vec!["a b c".to_string(), "d e f".to_string()]);
    }

    #[test]
    fn split_clauses_recurses_on_a_sentence_that_is_short_in_words_but_long_in_chars() {
        let sentence = "aaaaaaaaaa, bbbbbbbbbb, cccccccccc, dddddddddd";
        let parts = split_clauses(sentence, 100, 15).unwrap();
        assert!(parts.iter().all(|p| p.chars().count() <= 15));
        assert!(parts.len() > 1);
    }
}
