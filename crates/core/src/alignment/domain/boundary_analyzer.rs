use super::align_error::{filled_buffer, AlignError};

/// Legal alignment start and end columns of a reference window.
///
/// Column `j` is the prefix length `j`, i.e. the gap before phoneme `j`.
/// Columns run from `0` to `n` inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundaryFlags {
    start_allowed: Vec<bool>,
    end_allowed: Vec<bool>,
}

impl BoundaryFlags {
    pub fn start_allowed(&self, column: usize) -> bool {
        self.start_allowed.get(column).copied().unwrap_or(false)
    }

    pub fn end_allowed(&self, column: usize) -> bool {
        self.end_allowed.get(column).copied().unwrap_or(false)
    }

    /// Number of columns, `n + 1`.
    pub fn columns(&self) -> usize {
        self.start_allowed.len()
    }
}

/// Snaps alignments to whole words: a match may begin only at column 0 or at
/// the first phoneme of a word, and end only at column `n` or after the last
/// phoneme of a word.
pub struct BoundaryAnalyzer;

impl BoundaryAnalyzer {
    pub fn analyze(word_index: &[usize]) -> Result<BoundaryFlags, AlignError> {
        let n = word_index.len();
        let mut start_allowed = filled_buffer("start boundary", n + 1, false)?;
        let mut end_allowed = filled_buffer("end boundary", n + 1, false)?;

        for j in 1..n {
            let transition = word_index[j] != word_index[j - 1];
            start_allowed[j] = transition;
            end_allowed[j] = transition;
        }
        // With an empty window column 0 is also column n, and nothing can start.
        start_allowed[0] = n > 0;
        end_allowed[n] = true;

        Ok(BoundaryFlags {
            start_allowed,
            end_allowed,
        })
    }
}
