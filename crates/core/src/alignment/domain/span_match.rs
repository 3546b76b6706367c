use serde::{Deserialize, Serialize};

/// Best-scoring reference span for a query.
///
/// Columns are prefix lengths of the reference window, so the matched
/// phonemes are `reference[start_column..end_column]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpanMatch {
    pub start_column: usize,
    pub end_column: usize,
    pub raw_cost: f64,
    pub normalized_cost: f64,
}

impl SpanMatch {
    /// Number of reference phonemes covered.
    pub fn span_len(&self) -> usize {
        self.end_column - self.start_column
    }
}

/// Per-operation edit costs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditCosts {
    /// Substitution cost for phoneme pairs with no configured override.
    pub substitution: f64,
    /// Consume a recognized phoneme without advancing in the reference.
    pub deletion: f64,
    /// Consume a reference phoneme without advancing in the query.
    pub insertion: f64,
}

/// Scoring parameters for one alignment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignParams {
    /// Word index where the caller expects the speaker to be.
    pub expected_word: usize,
    /// Score penalty per word between a candidate's start word and `expected_word`.
    pub prior_weight: f64,
    pub costs: EditCosts,
}
