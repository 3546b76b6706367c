/// Default substitution cost for phoneme pairs absent from the cost table.
pub const DEFAULT_COST_SUBSTITUTION: f64 = 1.0;
/// Cost of consuming a reference phoneme the speaker skipped.
pub const DEFAULT_COST_INSERTION: f64 = 1.0;
/// Cost of consuming a recognized phoneme with no reference counterpart.
pub const DEFAULT_COST_DELETION: f64 = 0.8;

/// Score penalty per word between a candidate's start and the expected word.
pub const DEFAULT_PRIOR_WEIGHT: f64 = 0.005;

/// Largest normalized edit cost accepted as a segment match.
pub const DEFAULT_MAX_EDIT_DISTANCE: f64 = 0.25;

/// Used when a reference text has no words to average over.
pub const DEFAULT_AVG_PHONEMES_PER_WORD: f64 = 4.0;

/// Section of a cost table file that carries metadata, not costs.
pub const COST_TABLE_META_SECTION: &str = "_meta";
pub const COST_TABLE_PAIR_SEPARATOR: char = '|';
