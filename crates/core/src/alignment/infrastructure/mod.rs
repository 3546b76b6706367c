pub mod batch_aligner;
pub mod shared_substitution_model;
