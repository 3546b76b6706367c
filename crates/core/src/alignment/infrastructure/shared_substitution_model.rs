use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::alignment::domain::align_error::AlignError;
use crate::alignment::domain::alignment_engine::{check_word_index, AlignmentEngine};
use crate::alignment::domain::span_match::{AlignParams, SpanMatch};
use crate::phonemes::domain::phoneme_vocabulary::PhonemeId;
use crate::phonemes::domain::substitution_cost_table::SubstitutionCostTable;
use crate::phonemes::domain::substitution_model::SubstitutionModel;

/// Thread-safe handle to a [`SubstitutionModel`].
///
/// Alignments only need read access once their phonemes are encoded. The
/// write lock is taken solely to register unseen phonemes (and grow the
/// matrix), so concurrent alignments over a known inventory never block each
/// other.
#[derive(Clone)]
pub struct SharedSubstitutionModel {
    inner: Arc<RwLock<SubstitutionModel>>,
}

impl SharedSubstitutionModel {
    pub fn new(model: SubstitutionModel) -> Self {
        Self {
            inner: Arc::new(RwLock::new(model)),
        }
    }

    pub fn init_cost_matrix(&self, costs: &SubstitutionCostTable, default_cost: f64) {
        self.write().init_cost_matrix(costs, default_cost);
    }

    pub fn encode_sequence<S: AsRef<str>>(
        &self,
        phonemes: &[S],
    ) -> Result<Vec<PhonemeId>, AlignError> {
        let known = self.read().try_encode_sequence(phonemes)?;
        match known {
            Some(ids) => Ok(ids),
            None => self.write().encode_sequence(phonemes),
        }
    }

    pub fn align<Q: AsRef<str>, R: AsRef<str>>(
        &self,
        query: &[Q],
        reference: &[R],
        word_index: &[usize],
        params: &AlignParams,
    ) -> Result<Option<SpanMatch>, AlignError> {
        check_word_index(reference.len(), word_index.len())?;
        if query.is_empty() || reference.is_empty() {
            return Ok(None);
        }
        let query_ids = self.encode_sequence(query)?;
        let reference_ids = self.encode_sequence(reference)?;
        // Ids are never renumbered and the matrix only grows, so another
        // writer slipping in between encoding and this read is harmless.
        let model = self.read();
        AlignmentEngine::align_encoded(
            model.matrix(),
            &query_ids,
            &reference_ids,
            word_index,
            params,
        )
    }

    /// Runs `f` with read access to the model.
    pub fn with_model<R>(&self, f: impl FnOnce(&SubstitutionModel) -> R) -> R {
        f(&*self.read())
    }

    fn read(&self) -> RwLockReadGuard<'_, SubstitutionModel> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SubstitutionModel> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SharedSubstitutionModel {
    fn default() -> Self {
        Self::new(SubstitutionModel::default())
    }
}
