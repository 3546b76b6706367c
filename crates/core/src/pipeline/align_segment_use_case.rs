use serde::Serialize;
use thiserror::Error;

use crate::alignment::domain::align_error::{reserved_buffer, AlignError};
use crate::alignment::domain::span_match::SpanMatch;
use crate::alignment::infrastructure::shared_substitution_model::SharedSubstitutionModel;
use crate::reference::domain::reference_text::{ReferenceError, ReferenceText, ReferenceWindow};
use crate::shared::align_config::AlignConfig;

/// Word tag of prefix phonemes, which belong to no word of the text.
const PREFIX_TAG: usize = 0;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SegmentError {
    #[error(transparent)]
    Reference(#[from] ReferenceError),
    #[error(transparent)]
    Align(#[from] AlignError),
}

/// A recognized segment resolved to a range of words of the reference text.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SegmentAlignment {
    /// First matched word (global index, inclusive).
    pub start_word: usize,
    /// Last matched word (global index, inclusive).
    pub end_word: usize,
    /// `1 - normalized_cost`.
    pub confidence: f64,
    /// The match began inside the prefix put in front of the window.
    pub prefix_consumed: bool,
    /// Columns count the prefix phonemes, if any.
    pub span: SpanMatch,
}

/// Aligns one recognized segment against a caller-chosen window of the
/// reference text and maps the result back to words.
pub struct AlignSegmentUseCase<'a> {
    reference: &'a ReferenceText,
    model: SharedSubstitutionModel,
    config: AlignConfig,
}

impl<'a> AlignSegmentUseCase<'a> {
    pub fn new(
        reference: &'a ReferenceText,
        model: SharedSubstitutionModel,
        config: AlignConfig,
    ) -> Self {
        Self {
            reference,
            model,
            config,
        }
    }

    /// Returns `Ok(None)` when nothing in the window matches or the best
    /// match is worse than `max_edit_distance`; the caller then falls back to
    /// manual timing for this segment.
    pub fn execute<S: AsRef<str>>(
        &self,
        query: &[S],
        first_word: usize,
        end_word: usize,
        expected_word: usize,
    ) -> Result<Option<SegmentAlignment>, SegmentError> {
        let no_prefix: [&str; 0] = [];
        self.execute_with_prefix(query, &no_prefix, first_word, end_word, expected_word)
    }

    /// Like [`execute`](Self::execute), with `prefix` phonemes (e.g. a
    /// recited opening formula) placed in front of the window so a segment
    /// that fuses the two can still be matched.
    ///
    /// A match that starts in the prefix is reported from the first real word
    /// it covers, with `prefix_consumed` set. A match covering nothing but the
    /// prefix is rejected.
    pub fn execute_with_prefix<S: AsRef<str>, P: AsRef<str>>(
        &self,
        query: &[S],
        prefix: &[P],
        first_word: usize,
        end_word: usize,
        expected_word: usize,
    ) -> Result<Option<SegmentAlignment>, SegmentError> {
        let window = self.reference.window(first_word, end_word)?;
        let prefixed = if prefix.is_empty() {
            None
        } else {
            Some(PrefixedWindow::new(prefix, window)?)
        };

        let found = match &prefixed {
            None => {
                let params = self.config.params(expected_word);
                self.model.align(query, window.phonemes, window.word_index, &params)?
            }
            Some(prefixed) => {
                let params = self.config.params(expected_word.saturating_add(1));
                self.model.align(query, &prefixed.phonemes, &prefixed.tags, &params)?
            }
        };
        let Some(span) = found else {
            log::debug!(
                "Segment of {} phonemes: no match in words {first_word}..{end_word}",
                query.len()
            );
            return Ok(None);
        };

        if span.normalized_cost > self.config.max_edit_distance {
            log::debug!(
                "Segment of {} phonemes: best match {:.3} exceeds threshold {:.3}",
                query.len(),
                span.normalized_cost,
                self.config.max_edit_distance
            );
            return Ok(None);
        }

        let words = match &prefixed {
            None => window.word_span(&span).map(|(start, end)| (start, end, false)),
            Some(prefixed) => prefixed.word_span(&span),
        };
        let Some((start_word, end_word, prefix_consumed)) = words else {
            log::debug!("Segment of {} phonemes matched only the prefix", query.len());
            return Ok(None);
        };
        log::debug!(
            "Segment of {} phonemes matched words {start_word}..={end_word} (cost {:.3})",
            query.len(),
            span.normalized_cost
        );
        Ok(Some(SegmentAlignment {
            start_word,
            end_word,
            confidence: 1.0 - span.normalized_cost,
            prefix_consumed,
            span,
        }))
    }
}

/// Prefix phonemes followed by a window.
///
/// Word tags are the global word index plus one, leaving [`PREFIX_TAG`] for
/// the prefix. The expected word is shifted the same way, so every distance
/// the positional prior sees is unchanged and the prefix sits one word before
/// word 0.
struct PrefixedWindow<'a> {
    phonemes: Vec<&'a str>,
    tags: Vec<usize>,
}

impl<'a> PrefixedWindow<'a> {
    fn new<P: AsRef<str>>(
        prefix: &'a [P],
        window: ReferenceWindow<'a>,
    ) -> Result<Self, AlignError> {
        let len = prefix.len() + window.phonemes.len();
        let mut phonemes = reserved_buffer("prefixed reference", len)?;
        phonemes.extend(prefix.iter().map(|p| p.as_ref()));
        phonemes.extend(window.phonemes.iter().map(String::as_str));

        let mut tags = reserved_buffer("prefixed word index", len)?;
        tags.extend(std::iter::repeat(PREFIX_TAG).take(prefix.len()));
        tags.extend(window.word_index.iter().map(|&word| word + 1));
        Ok(Self { phonemes, tags })
    }

    /// Inclusive global word range of a match and whether it started in the
    /// prefix. `None` for an empty or prefix-only span.
    fn word_span(&self, found: &SpanMatch) -> Option<(usize, usize, bool)> {
        let covered = self.tags.get(found.start_column..found.end_column)?;
        let first_real = covered.iter().position(|&tag| tag != PREFIX_TAG)?;
        let last = *covered.last()?;
        Some((covered[first_real] - 1, last - 1, first_real > 0))
    }
}
