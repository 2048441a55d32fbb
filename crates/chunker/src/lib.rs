//! Length-aware, boundary-respecting text segmentation.
//!
//! Mirrors the cascading-split shape of the teacher pack's audio chunker
//! (paragraph/sentence/clause levels, single-chunk short-circuit, greedy
//! packing toward an "optimal" target with a hard ceiling) applied to text
//! instead of waveform samples.

mod abbreviations;
mod cascade;

use tts_gateway_core::chunk::Chunk;
use tts_gateway_core::error::GatewayError;
use tts_gateway_core::profile::BackendProfile;

/// Word/char limits the cascade packs toward, independent of a full
/// [`BackendProfile`] so the algorithm stays unit-testable on its own.
#[derive(Debug, Clone, Copy)]
pub struct ChunkerConfig {
    pub optimal_words: usize,
    pub max_words: usize,
    pub max_chars: usize,
    pub needs_chunking: bool,
}

impl From<&BackendProfile> for ChunkerConfig {
    fn from(profile: &BackendProfile) -> Self {
        ChunkerConfig {
            optimal_words: profile.optimal_words,
            max_words: profile.max_words,
            max_chars: profile.max_chars,
            needs_chunking: profile.needs_chunking,
        }
    }
}

/// Split `text` into chunks that fit `config`'s limits.
///
/// Short-circuits to a single chunk when the backend doesn't need chunking
/// at all, or when the whole (normalized) text already fits under both the
/// optimal word count and the hard character ceiling. Otherwise runs the
/// paragraph → sentence → clause cascade described in
/// [`cascade::split_into_chunks`].
pub fn chunk(text: &str, config: &ChunkerConfig) -> Result<Vec<Chunk>, GatewayError> {
    let normalized = cascade::normalize_whitespace(text);
    if normalized.is_empty() {
        return Err(GatewayError::InvalidRequest(
            "input text is empty after normalization".to_string(),
        ));
    }

    let word_count = normalized.split_whitespace().count();
    let char_count = normalized.chars().count();

    if !config.needs_chunking || (word_count <= config.optimal_words && char_count <= config.max_chars) {
        return Ok(vec![Chunk {
            index: 0,
            text: normalized,
            is_terminal: true,
        }]);
    }

    let pieces = cascade::split_into_chunks(text, config)?;
    let last = pieces.len().saturating_sub(1);
    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(index, text)| Chunk {
            index,
            is_terminal: index == last,
            text,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ChunkerConfig {
        ChunkerConfig {
            optimal_words: 10,
            max_words: 20,
            max_chars: 140,
            needs_chunking: true,
        }
    }

    #[test]
    fn exact_at_optimal_words_is_one_chunk() {
        let text = "one two three four five six seven eight nine ten.";
        let chunks = chunk(text, &config()).unwrap();
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_terminal);
    }

    #[test]
    fn one_over_optimal_but_under_max_is_still_one_chunk() {
        let text = "one two three four five six seven eight nine ten eleven.";
        let chunks = chunk(text, &config()).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn no_delimiters_under_max_is_one_chunk() {
        let text = "onewordwithnospacesatallbutshort";
        let chunks = chunk(text, &config()).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn needs_chunking_false_bypasses_the_cascade_regardless_of_length() {
        let cfg = ChunkerConfig {
            needs_chunking: false,
            ..config()
        };
        let long = "word ".repeat(500);
        let chunks = chunk(&long, &cfg).unwrap();
        assert_eq!(chunks.len(), 1);
    }

    #[test]
    fn long_text_splits_on_sentence_boundaries() {
        let text = "Dr. Smith arrived early. He reviewed the chart, then left again. \
                     The patient slept through the night. Morning rounds started at seven.";
        let chunks = chunk(text, &config()).unwrap();
        assert!(chunks.len() > 1);
        for c in &chunks {
            assert!(c.word_count() <= config().max_words);
        }
    }

    #[test]
    fn chunks_never_break_inside_a_word() {
        let text = "supercalifragilisticexpialidocious is a long word but this sentence \
                     has several more words trailing after it to force a split somewhere.";
        let chunks = chunk(text, &config()).unwrap();
        let reassembled: Vec<&str> = text.split_whitespace().collect();
        let mut cursor = 0;
        for c in &chunks {
            let words: Vec<&str> = c.text.split_whitespace().collect();
            assert_eq!(&reassembled[cursor..cursor + words.len()], words.as_slice());
            cursor += words.len();
        }
        assert_eq!(cursor, reassembled.len());
    }

    #[test]
    fn unsplittable_oversized_unit_fails_with_chunk_too_large() {
        // A single run-on clause with no sentence or clause delimiters at
        // all, far longer than max_words, cannot be reduced by the cascade.
        let text = "word ".repeat(50);
        let cfg = ChunkerConfig {
            optimal_words: 5,
            max_words: 10,
            max_chars: 1000,
            needs_chunking: true,
        };
        let err = chunk(&text, &cfg).unwrap_err();
        assert_eq!(err.kind(), "chunk_too_large");
    }

    #[test]
    fn concatenation_preserves_content() {
        let text = "First sentence here. Second sentence follows, with a clause; and another.";
        let chunks = chunk(text, &config()).unwrap();
        let rejoined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(rejoined, cascade::normalize_whitespace(text));
    }
}
