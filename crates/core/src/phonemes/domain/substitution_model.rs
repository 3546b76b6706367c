use super::phoneme_vocabulary::{PhonemeId, PhonemeVocabulary};
use super::substitution_cost_matrix::SubstitutionCostMatrix;
use super::substitution_cost_table::SubstitutionCostTable;
use crate::alignment::domain::align_error::{reserved_buffer, AlignError};
use crate::shared::constants::DEFAULT_COST_SUBSTITUTION;

/// Phoneme vocabulary together with the substitution costs keyed by it.
///
/// This is the only state that outlives a single alignment. It is owned by the
/// caller and handed to every alignment, so independent configurations can
/// coexist (see `SharedSubstitutionModel` for the cross-thread variant).
#[derive(Debug, Clone)]
pub struct SubstitutionModel {
    vocabulary: PhonemeVocabulary,
    matrix: SubstitutionCostMatrix,
}

impl SubstitutionModel {
    /// An empty model where every substitution costs `default_cost`.
    pub fn new(default_cost: f64) -> Self {
        Self {
            vocabulary: PhonemeVocabulary::new(),
            matrix: SubstitutionCostMatrix::new(0, default_cost),
        }
    }

    pub fn from_cost_table(costs: &SubstitutionCostTable, default_cost: f64) -> Self {
        let mut model = Self::new(default_cost);
        model.init_cost_matrix(costs, default_cost);
        model
    }

    /// Rebuilds the cost matrix from scratch.
    ///
    /// Every phoneme named in `costs` is registered first, so the matrix
    /// covers the whole configured inventory. Already-assigned ids are kept.
    /// Overrides are applied exactly as given; no symmetry is inferred.
    pub fn init_cost_matrix(&mut self, costs: &SubstitutionCostTable, default_cost: f64) {
        for (a, b, _) in costs.iter() {
            self.vocabulary.encode(a);
            self.vocabulary.encode(b);
        }
        let mut matrix = SubstitutionCostMatrix::new(self.vocabulary.size(), default_cost);
        for (a, b, cost) in costs.iter() {
            if let (Some(ia), Some(ib)) = (self.vocabulary.id_of(a), self.vocabulary.id_of(b)) {
                matrix.set(ia, ib, cost);
            }
        }
        log::debug!(
            "Initialized substitution matrix: {} phonemes, {} overrides, default {default_cost}",
            matrix.size(),
            costs.len()
        );
        self.matrix = matrix;
    }

    /// Encodes a phoneme sequence, registering unseen phonemes and growing
    /// the matrix to cover them.
    pub fn encode_sequence<S: AsRef<str>>(
        &mut self,
        phonemes: &[S],
    ) -> Result<Vec<PhonemeId>, AlignError> {
        let mut ids = reserved_buffer("phoneme ids", phonemes.len())?;
        ids.extend(phonemes.iter().map(|p| self.vocabulary.encode(p.as_ref())));
        if self.vocabulary.size() > self.matrix.size() {
            self.matrix.grow(self.vocabulary.size())?;
        }
        Ok(ids)
    }

    /// Read-only encoding. Returns `Ok(None)` if any phoneme is unknown or
    /// not yet covered by the matrix.
    pub fn try_encode_sequence<S: AsRef<str>>(
        &self,
        phonemes: &[S],
    ) -> Result<Option<Vec<PhonemeId>>, AlignError> {
        let mut ids = reserved_buffer("phoneme ids", phonemes.len())?;
        for p in phonemes {
            match self.vocabulary.id_of(p.as_ref()) {
                Some(id) if id < self.matrix.size() => ids.push(id),
                _ => return Ok(None),
            }
        }
        Ok(Some(ids))
    }

    pub fn lookup(&self, a: PhonemeId, b: PhonemeId) -> f64 {
        self.matrix.lookup(a, b)
    }

    pub fn vocabulary(&self) -> &PhonemeVocabulary {
        &self.vocabulary
    }

    pub fn matrix(&self) -> &SubstitutionCostMatrix {
        &self.matrix
    }
}

impl Default for SubstitutionModel {
    fn default() -> Self {
        Self::new(DEFAULT_COST_SUBSTITUTION)
    }
}
