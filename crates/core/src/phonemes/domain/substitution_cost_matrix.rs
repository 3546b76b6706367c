use super::phoneme_vocabulary::PhonemeId;
use crate::alignment::domain::align_error::{filled_buffer, AlignError};

/// Dense square table of substitution costs indexed by phoneme id.
///
/// Row is the recognized phoneme, column the reference phoneme. The diagonal
/// always costs zero. Cells never overridden stay unconfigured and resolve to
/// whatever fallback the caller supplies: `default_cost` for
/// [`lookup`](Self::lookup), the per-alignment substitution cost in the DP.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionCostMatrix {
    size: usize,
    default_cost: f64,
    costs: Vec<Option<f64>>,
}

impl SubstitutionCostMatrix {
    pub fn new(size: usize, default_cost: f64) -> Self {
        Self {
            size,
            default_cost,
            costs: vec![None; size * size],
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn default_cost(&self) -> f64 {
        self.default_cost
    }

    /// Overrides the cost of replacing `a` with `b`. The reverse ordering is
    /// left untouched. Ids outside the matrix are ignored.
    pub fn set(&mut self, a: PhonemeId, b: PhonemeId, cost: f64) {
        if a < self.size && b < self.size {
            self.costs[a * self.size + b] = Some(cost);
        }
    }

    /// The override for `a → b`, if one was set.
    pub fn configured(&self, a: PhonemeId, b: PhonemeId) -> Option<f64> {
        if a < self.size && b < self.size {
            self.costs[a * self.size + b]
        } else {
            None
        }
    }

    pub fn lookup(&self, a: PhonemeId, b: PhonemeId) -> f64 {
        self.lookup_or(a, b, self.default_cost)
    }

    /// Zero for `a == b`, the override if configured, else `fallback`.
    pub fn lookup_or(&self, a: PhonemeId, b: PhonemeId, fallback: f64) -> f64 {
        if a == b {
            return 0.0;
        }
        self.configured(a, b).unwrap_or(fallback)
    }

    /// Enlarges the matrix to `new_size`, keeping every override. Cells
    /// involving a new id start unconfigured. Shrinking is a no-op.
    pub fn grow(&mut self, new_size: usize) -> Result<(), AlignError> {
        if new_size <= self.size {
            return Ok(());
        }
        let cells = new_size.checked_mul(new_size).unwrap_or(usize::MAX);
        let mut costs = filled_buffer("substitution matrix", cells, None)?;
        for row in 0..self.size {
            let old = &self.costs[row * self.size..(row + 1) * self.size];
            costs[row * new_size..row * new_size + self.size].copy_from_slice(old);
        }
        log::warn!(
            "Growing substitution matrix from {} to {new_size} phonemes",
            self.size
        );
        self.costs = costs;
        self.size = new_size;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_new_fills_default_with_zero_diagonal() {
        let m = SubstitutionCostMatrix::new(3, 1.5);
        for a in 0..3 {
            for b in 0..3 {
                let expected = if a == b { 0.0 } else { 1.5 };
                assert_relative_eq!(m.lookup(a, b), expected);
            }
        }
    }

    #[test]
    fn test_set_is_asymmetric() {
        let mut m = SubstitutionCostMatrix::new(2, 1.0);
        m.set(0, 1, 0.25);
        assert_relative_eq!(m.lookup(0, 1), 0.25);
        assert_relative_eq!(m.lookup(1, 0), 1.0);
    }

    #[test]
    fn test_diagonal_lookup_ignores_override() {
        let mut m = SubstitutionCostMatrix::new(2, 1.0);
        m.set(1, 1, 0.7);
        assert_relative_eq!(m.lookup(1, 1), 0.0);
    }

    #[test]
    fn test_unconfigured_cells_resolve_to_fallback() {
        let mut m = SubstitutionCostMatrix::new(3, 1.0);
        m.set(0, 1, 0.25);
        assert_eq!(m.configured(0, 1), Some(0.25));
        assert_eq!(m.configured(0, 2), None);
        assert_relative_eq!(m.lookup_or(0, 1, 0.3), 0.25);
        assert_relative_eq!(m.lookup_or(0, 2, 0.3), 0.3);
        assert_relative_eq!(m.lookup_or(2, 2, 0.3), 0.0);
    }

    #[rstest]
    #[case::row_out_of_bounds(5, 0)]
    #[case::column_out_of_bounds(0, 5)]
    #[case::both_out_of_bounds(7, 9)]
    fn test_out_of_bounds_lookup_returns_default(#[case] a: usize, #[case] b: usize) {
        let m = SubstitutionCostMatrix::new(2, 0.9);
        assert_relative_eq!(m.lookup(a, b), 0.9);
        assert_relative_eq!(m.lookup_or(a, b, 2.0), 2.0);
    }

    #[test]
    fn test_out_of_bounds_same_id_is_free() {
        let m = SubstitutionCostMatrix::new(1, 1.0);
        assert_relative_eq!(m.lookup(4, 4), 0.0);
    }

    #[test]
    fn test_set_out_of_bounds_is_ignored() {
        let mut m = SubstitutionCostMatrix::new(2, 1.0);
        m.set(0, 3, 0.1);
        assert_eq!(m, SubstitutionCostMatrix::new(2, 1.0));
    }

    #[test]
    fn test_grow_preserves_overrides() {
        let mut m = SubstitutionCostMatrix::new(2, 1.0);
        m.set(0, 1, 0.3);
        m.set(1, 0, 0.4);
        m.grow(4).unwrap();
        assert_eq!(m.size(), 4);
        assert_relative_eq!(m.lookup(0, 1), 0.3);
        assert_relative_eq!(m.lookup(1, 0), 0.4);
        assert_relative_eq!(m.lookup(0, 3), 1.0);
        assert_relative_eq!(m.lookup(3, 1), 1.0);
        assert_relative_eq!(m.lookup(2, 2), 0.0);
        assert_relative_eq!(m.lookup(3, 3), 0.0);
        assert_eq!(m.configured(0, 3), None);
    }

    #[test]
    fn test_grow_smaller_is_noop() {
        let mut m = SubstitutionCostMatrix::new(3, 1.0);
        m.set(0, 2, 0.5);
        let before = m.clone();
        m.grow(2).unwrap();
        assert_eq!(m, before);
    }

    #[test]
    fn test_grow_from_empty() {
        let mut m = SubstitutionCostMatrix::new(0, 1.0);
        m.grow(2).unwrap();
        assert_relative_eq!(m.lookup(0, 1), 1.0);
        assert_relative_eq!(m.lookup(1, 1), 0.0);
    }

    #[test]
    fn test_grow_reports_allocation_failure_and_keeps_matrix() {
        let mut m = SubstitutionCostMatrix::new(2, 1.0);
        m.set(0, 1, 0.3);
        let before = m.clone();
        assert!(matches!(
            m.grow(usize::MAX),
            Err(AlignError::Allocation {
                buffer: "substitution matrix",
                ..
            })
        ));
        assert_eq!(m, before);
    }
}
