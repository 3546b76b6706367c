//! Word-boundary-constrained alignment of recognized phonemes against a
//! phonetically transcribed reference text.

pub mod alignment {
    pub mod domain {
        pub mod align_error;
        pub mod alignment_engine;
        pub mod boundary_analyzer;
        pub mod span_match;
    }
    pub mod infrastructure;
}

pub mod phonemes {
    pub mod domain {
        pub mod phoneme_vocabulary;
        pub mod substitution_cost_matrix;
        pub mod substitution_cost_table;
        pub mod substitution_model;
    }
    pub mod infrastructure;
}

pub mod reference {
    pub mod domain {
        pub mod reference_text;
    }
}

pub mod pipeline {
    pub mod align_segment_use_case;
}

pub mod shared {
    pub mod align_config;
    pub mod constants;
}
