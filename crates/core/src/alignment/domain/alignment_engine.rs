use std::mem;

use super::align_error::{filled_buffer, AlignError};
use super::boundary_analyzer::{BoundaryAnalyzer, BoundaryFlags};
use super::span_match::{AlignParams, SpanMatch};
use crate::phonemes::domain::phoneme_vocabulary::PhonemeId;
use crate::phonemes::domain::substitution_cost_matrix::SubstitutionCostMatrix;
use crate::phonemes::domain::substitution_model::SubstitutionModel;

/// Predecessor chosen for a DP cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Substitution,
    Deletion,
    Insertion,
}

/// Ties go to substitution, then deletion, then insertion.
fn choose_step(substitution: f64, deletion: f64, insertion: f64) -> Step {
    if substitution <= deletion && substitution <= insertion {
        Step::Substitution
    } else if deletion <= insertion {
        Step::Deletion
    } else {
        Step::Insertion
    }
}

/// One DP row: cost of the best partial alignment ending at each column and
/// the column where that alignment started.
struct Row {
    cost: Vec<f64>,
    start: Vec<Option<usize>>,
}

impl Row {
    fn unreachable(columns: usize) -> Result<Self, AlignError> {
        Ok(Self {
            cost: filled_buffer("cost row", columns, f64::INFINITY)?,
            start: filled_buffer("start row", columns, None)?,
        })
    }
}

/// Word-boundary-constrained substring alignment.
///
/// Finds the contiguous, word-aligned run of the reference that best explains
/// the query under an edit-distance model, breaking ties between repeated
/// phrases with a prior on the distance to an expected word.
pub struct AlignmentEngine;

impl AlignmentEngine {
    /// Aligns phoneme symbols, registering unseen phonemes with `model`.
    ///
    /// Returns `Ok(None)` when either sequence is empty or no word-aligned
    /// span has a finite score.
    pub fn align<Q: AsRef<str>, R: AsRef<str>>(
        model: &mut SubstitutionModel,
        query: &[Q],
        reference: &[R],
        word_index: &[usize],
        params: &AlignParams,
    ) -> Result<Option<SpanMatch>, AlignError> {
        check_word_index(reference.len(), word_index.len())?;
        if query.is_empty() || reference.is_empty() {
            return Ok(None);
        }
        let query_ids = model.encode_sequence(query)?;
        let reference_ids = model.encode_sequence(reference)?;
        Self::align_encoded(model.matrix(), &query_ids, &reference_ids, word_index, params)
    }

    /// Aligns already-encoded sequences. Never mutates shared state, so any
    /// number of calls may run concurrently against the same matrix.
    pub fn align_encoded(
        matrix: &SubstitutionCostMatrix,
        query: &[PhonemeId],
        reference: &[PhonemeId],
        word_index: &[usize],
        params: &AlignParams,
    ) -> Result<Option<SpanMatch>, AlignError> {
        check_word_index(reference.len(), word_index.len())?;
        let m = query.len();
        let n = reference.len();
        if m == 0 || n == 0 {
            return Ok(None);
        }

        let boundaries = BoundaryAnalyzer::analyze(word_index)?;
        let last_row = fill_rows(matrix, query, reference, &boundaries, params)?;
        let best = select_best(&last_row, &boundaries, word_index, m, params);

        match &best {
            Some(found) => log::debug!(
                "Aligned {m} query phonemes to columns {}..{} of {n} (cost {:.3}, norm {:.3})",
                found.start_column,
                found.end_column,
                found.raw_cost,
                found.normalized_cost
            ),
            None => log::debug!("No word-aligned span found for {m} query phonemes in {n}"),
        }
        Ok(best)
    }
}

pub(crate) fn check_word_index(phonemes: usize, word_indices: usize) -> Result<(), AlignError> {
    if phonemes == word_indices {
        Ok(())
    } else {
        Err(AlignError::MismatchedWordIndex {
            phonemes,
            word_indices,
        })
    }
}

/// Runs the DP with two rolling rows and returns the final row (`i = m`).
fn fill_rows(
    matrix: &SubstitutionCostMatrix,
    query: &[PhonemeId],
    reference: &[PhonemeId],
    boundaries: &BoundaryFlags,
    params: &AlignParams,
) -> Result<Row, AlignError> {
    let n = reference.len();
    let costs = params.costs;
    let mut prev = Row::unreachable(n + 1)?;
    let mut curr = Row::unreachable(n + 1)?;

    // The match may begin, with nothing consumed, at any word start.
    for j in 0..=n {
        if boundaries.start_allowed(j) {
            prev.cost[j] = 0.0;
            prev.start[j] = Some(j);
        }
    }

    for (i, &p) in query.iter().enumerate() {
        let consumed = i + 1;
        if boundaries.start_allowed(0) {
            curr.cost[0] = consumed as f64 * costs.deletion;
            curr.start[0] = Some(0);
        } else {
            curr.cost[0] = f64::INFINITY;
            curr.start[0] = None;
        }

        for j in 1..=n {
            let substitution =
                prev.cost[j - 1] + matrix.lookup_or(p, reference[j - 1], costs.substitution);
            let deletion = prev.cost[j] + costs.deletion;
            let insertion = curr.cost[j - 1] + costs.insertion;

            let (cost, start) = match choose_step(substitution, deletion, insertion) {
                Step::Substitution => (substitution, prev.start[j - 1]),
                Step::Deletion => (deletion, prev.start[j]),
                Step::Insertion => (insertion, curr.start[j - 1]),
            };
            curr.cost[j] = cost;
            curr.start[j] = start;
        }

        mem::swap(&mut prev, &mut curr);
    }

    Ok(prev)
}

/// Picks the end column with the lowest normalized cost plus positional prior.
///
/// Columns are scanned in ascending order and only a strictly better score
/// replaces the current best, so the leftmost of equal candidates wins.
fn select_best(
    last_row: &Row,
    boundaries: &BoundaryFlags,
    word_index: &[usize],
    m: usize,
    params: &AlignParams,
) -> Option<SpanMatch> {
    let n = word_index.len();
    let mut best_score = f64::INFINITY;
    let mut best = None;

    for j in 1..=n {
        if !boundaries.end_allowed(j) {
            continue;
        }
        let cost = last_row.cost[j];
        if !cost.is_finite() {
            continue;
        }
        let Some(start) = last_row.start[j] else {
            continue;
        };

        let denom = m.max(j - start).max(1) as f64;
        let normalized_cost = cost / denom;
        let start_word = if start < n {
            word_index[start]
        } else {
            word_index[n - 1]
        };
        let prior = params.prior_weight * start_word.abs_diff(params.expected_word) as f64;
        let score = normalized_cost + prior;

        if score < best_score {
            best_score = score;
            best = Some(SpanMatch {
                start_column: start,
                end_column: j,
                raw_cost: cost,
                normalized_cost,
            });
        }
    }

    best
}
