use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::alignment::domain::span_match::SpanMatch;
use crate::shared::constants::DEFAULT_AVG_PHONEMES_PER_WORD;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferenceError {
    #[error("word window {first}..{end} is invalid for a text of {num_words} words")]
    InvalidWindow {
        first: usize,
        end: usize,
        num_words: usize,
    },
}

/// One word of the canonical text with its phonetic transcription.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReferenceWord {
    pub text: String,
    pub phonemes: Vec<String>,
    /// Free-form position label, e.g. `"2:255:3"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

/// Canonical text flattened for alignment.
///
/// Word indices are global: phoneme `k` belongs to word `word_index()[k]`
/// of the whole text, so matches in any window map straight back to words.
#[derive(Clone, Debug)]
pub struct ReferenceText {
    words: Vec<ReferenceWord>,
    phonemes: Vec<String>,
    word_index: Vec<usize>,
    /// `word_offsets[w]` is the first phoneme of word `w`; one trailing
    /// sentinel equals the total phoneme count.
    word_offsets: Vec<usize>,
}

impl ReferenceText {
    pub fn new(words: Vec<ReferenceWord>) -> Self {
        let total: usize = words.iter().map(|w| w.phonemes.len()).sum();
        let mut phonemes = Vec::with_capacity(total);
        let mut word_index = Vec::with_capacity(total);
        let mut word_offsets = Vec::with_capacity(words.len() + 1);

        for (w, word) in words.iter().enumerate() {
            word_offsets.push(phonemes.len());
            phonemes.extend(word.phonemes.iter().cloned());
            word_index.extend(std::iter::repeat(w).take(word.phonemes.len()));
        }
        word_offsets.push(phonemes.len());

        Self {
            words,
            phonemes,
            word_index,
            word_offsets,
        }
    }

    pub fn words(&self) -> &[ReferenceWord] {
        &self.words
    }

    pub fn word(&self, index: usize) -> Option<&ReferenceWord> {
        self.words.get(index)
    }

    pub fn num_words(&self) -> usize {
        self.words.len()
    }

    pub fn phonemes(&self) -> &[String] {
        &self.phonemes
    }

    pub fn word_index(&self) -> &[usize] {
        &self.word_index
    }

    pub fn avg_phonemes_per_word(&self) -> f64 {
        if self.words.is_empty() {
            DEFAULT_AVG_PHONEMES_PER_WORD
        } else {
            self.phonemes.len() as f64 / self.words.len() as f64
        }
    }

    /// Slices words `first..end` out of the text.
    ///
    /// Which window to search is the caller's decision; this only checks that
    /// the range exists.
    pub fn window(&self, first: usize, end: usize) -> Result<ReferenceWindow<'_>, ReferenceError> {
        if first > end || end > self.words.len() {
            return Err(ReferenceError::InvalidWindow {
                first,
                end,
                num_words: self.words.len(),
            });
        }
        let from = self.word_offsets[first];
        let to = self.word_offsets[end];
        Ok(ReferenceWindow {
            first_word: first,
            end_word: end,
            phonemes: &self.phonemes[from..to],
            word_index: &self.word_index[from..to],
        })
    }
}

/// A contiguous run of whole words borrowed from a [`ReferenceText`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceWindow<'a> {
    pub first_word: usize,
    pub end_word: usize,
    pub phonemes: &'a [String],
    pub word_index: &'a [usize],
}

impl ReferenceWindow<'_> {
    /// Inclusive global word range covered by a match in this window, or
    /// `None` for an empty span.
    pub fn word_span(&self, found: &SpanMatch) -> Option<(usize, usize)> {
        if found.start_column >= found.end_column || found.end_column > self.word_index.len() {
            return None;
        }
        Some((
            self.word_index[found.start_column],
            self.word_index[found.end_column - 1],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn word(text: &str, phonemes: &[&str]) -> ReferenceWord {
        ReferenceWord {
            text: text.to_string(),
            phonemes: phonemes.iter().map(|p| p.to_string()).collect(),
            location: None,
        }
    }

    fn text() -> ReferenceText {
        ReferenceText::new(vec![
            word("cat", &["k", "a", "t"]),
            word("and", &["a", "n", "d"]),
            word("dog", &["d", "o", "g"]),
            word("o", &["o"]),
        ])
    }

    #[test]
    fn test_flattens_with_global_word_index() {
        let t = text();
        assert_eq!(t.phonemes().len(), 10);
        assert_eq!(t.word_index(), &[0, 0, 0, 1, 1, 1, 2, 2, 2, 3]);
        assert_eq!(t.num_words(), 4);
    }

    #[test]
    fn test_avg_phonemes_per_word() {
        assert_relative_eq!(text().avg_phonemes_per_word(), 2.5);
        assert_relative_eq!(
            ReferenceText::new(Vec::new()).avg_phonemes_per_word(),
            DEFAULT_AVG_PHONEMES_PER_WORD
        );
    }

    #[test]
    fn test_window_slices_whole_words() {
        let t = text();
        let w = t.window(1, 3).unwrap();
        assert_eq!(w.phonemes, &["a", "n", "d", "d", "o", "g"]);
        assert_eq!(w.word_index, &[1, 1, 1, 2, 2, 2]);
        assert_eq!((w.first_word, w.end_word), (1, 3));
    }

    #[test]
    fn test_empty_window() {
        let t = text();
        let w = t.window(2, 2).unwrap();
        assert!(w.phonemes.is_empty());
    }

    #[rstest]
    #[case::inverted(3, 1)]
    #[case::past_end(2, 5)]
    fn test_invalid_window(#[case] first: usize, #[case] end: usize) {
        assert_eq!(
            text().window(first, end),
            Err(ReferenceError::InvalidWindow {
                first,
                end,
                num_words: 4
            })
        );
    }

    #[test]
    fn test_word_span_maps_columns_to_global_words() {
        let t = text();
        let w = t.window(1, 4).unwrap();
        let found = SpanMatch {
            start_column: 3,
            end_column: 7,
            raw_cost: 0.0,
            normalized_cost: 0.0,
        };
        assert_eq!(w.word_span(&found), Some((2, 3)));
    }

    #[test]
    fn test_word_span_rejects_empty_span() {
        let t = text();
        let w = t.window(0, 2).unwrap();
        let found = SpanMatch {
            start_column: 3,
            end_column: 3,
            raw_cost: 0.0,
            normalized_cost: 0.0,
        };
        assert_eq!(w.word_span(&found), None);
    }

    #[test]
    fn test_reference_word_json_location_optional() {
        let w: ReferenceWord =
            serde_json::from_str(r#"{"text": "dog", "phonemes": ["d", "o", "g"]}"#).unwrap();
        assert_eq!(w.location, None);
        let json = serde_json::to_string(&w).unwrap();
        assert!(!json.contains("location"));
    }
}
