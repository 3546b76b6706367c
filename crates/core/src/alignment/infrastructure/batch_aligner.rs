use std::thread;

use serde::{Deserialize, Serialize};

use super::shared_substitution_model::SharedSubstitutionModel;
use crate::alignment::domain::align_error::AlignError;
use crate::alignment::domain::span_match::{AlignParams, SpanMatch};

const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// One independent alignment request.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AlignmentJob {
    pub query: Vec<String>,
    pub reference: Vec<String>,
    pub word_index: Vec<usize>,
    pub params: AlignParams,
}

pub type JobResult = Result<Option<SpanMatch>, AlignError>;

/// Aligns many segments in parallel against one shared model.
///
/// Layout: `feeder → [worker × N] → collector`. Each worker runs whole
/// alignments with its own DP buffers; only the model is shared.
pub struct BatchAligner {
    model: SharedSubstitutionModel,
    workers: usize,
    channel_capacity: usize,
}

impl BatchAligner {
    pub fn new(model: SharedSubstitutionModel, workers: usize) -> Self {
        Self {
            model,
            workers: workers.max(1),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }

    /// Uses one worker per available CPU.
    pub fn with_available_parallelism(model: SharedSubstitutionModel) -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self::new(model, workers)
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Runs every job and returns the results in job order. A failing job
    /// does not affect the others.
    pub fn run(&self, jobs: &[AlignmentJob]) -> Vec<JobResult> {
        if jobs.is_empty() {
            return Vec::new();
        }
        let workers = self.workers.min(jobs.len());
        log::debug!("Aligning {} segments on {workers} workers", jobs.len());

        let (job_tx, job_rx) =
            crossbeam_channel::bounded::<(usize, &AlignmentJob)>(self.channel_capacity);
        let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, JobResult)>();

        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let model = &self.model;
                scope.spawn(move || {
                    for (index, job) in job_rx {
                        let result =
                            model.align(&job.query, &job.reference, &job.word_index, &job.params);
                        if result_tx.send((index, result)).is_err() {
                            break;
                        }
                    }
                });
            }
            drop(job_rx);
            drop(result_tx);

            for item in jobs.iter().enumerate() {
                if job_tx.send(item).is_err() {
                    break;
                }
            }
            drop(job_tx);
        });

        let mut slots: Vec<Option<JobResult>> = (0..jobs.len()).map(|_| None).collect();
        for (index, result) in result_rx {
            slots[index] = Some(result);
        }
        // Workers run inside the scope, so every job has reported by now.
        slots.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alignment::domain::span_match::EditCosts;
    use crate::phonemes::domain::substitution_model::SubstitutionModel;
    use approx::assert_relative_eq;

    fn job(
        query: &[&str],
        reference: &[&str],
        word_index: &[usize],
        expected_word: usize,
    ) -> AlignmentJob {
        AlignmentJob {
            query: query.iter().map(|s| s.to_string()).collect(),
            reference: reference.iter().map(|s| s.to_string()).collect(),
            word_index: word_index.to_vec(),
            params: AlignParams {
                expected_word,
                prior_weight: 0.5,
                costs: EditCosts {
                    substitution: 1.0,
                    deletion: 0.8,
                    insertion: 1.0,
                },
            },
        }
    }

    fn jobs() -> Vec<AlignmentJob> {
        let reference = ["a", "b", "a", "b", "c", "d"];
        let word_index = [0, 0, 1, 1, 2, 2];
        vec![
            job(&["a", "b"], &reference, &word_index, 0),
            job(&["a", "b"], &reference, &word_index, 1),
            job(&["c", "d"], &reference, &word_index, 2),
            job(&[], &reference, &word_index, 0),
            job(&["a"], &reference, &word_index[..3], 0),
            job(&["x", "d"], &reference, &word_index, 2),
        ]
    }

    #[test]
    fn test_results_follow_job_order_and_match_sequential() {
        let jobs = jobs();
        let batch = BatchAligner::new(SharedSubstitutionModel::default(), 3).run(&jobs);

        let sequential = SharedSubstitutionModel::default();
        let expected: Vec<JobResult> = jobs
            .iter()
            .map(|j| sequential.align(&j.query, &j.reference, &j.word_index, &j.params))
            .collect();

        assert_eq!(batch, expected);
        assert_eq!(batch[0].as_ref().unwrap().as_ref().unwrap().start_column, 0);
        assert_eq!(batch[1].as_ref().unwrap().as_ref().unwrap().start_column, 2);
        assert_eq!(batch[2].as_ref().unwrap().as_ref().unwrap().start_column, 4);
        assert_eq!(batch[3], Ok(None));
        assert!(matches!(
            batch[4],
            Err(AlignError::MismatchedWordIndex { .. })
        ));
    }

    #[test]
    fn test_each_job_uses_its_own_substitution_cost() {
        let mut cheap = job(&["a"], &["b"], &[0], 0);
        cheap.params.costs = EditCosts {
            substitution: 0.3,
            deletion: 5.0,
            insertion: 5.0,
        };
        let mut dear = cheap.clone();
        dear.params.costs.substitution = 2.0;

        let results = BatchAligner::new(SharedSubstitutionModel::default(), 2).run(&[cheap, dear]);
        let raw: Vec<f64> = results
            .iter()
            .map(|r| r.as_ref().unwrap().as_ref().unwrap().raw_cost)
            .collect();
        assert_relative_eq!(raw[0], 0.3);
        assert_relative_eq!(raw[1], 2.0);
    }

    #[test]
    fn test_empty_batch() {
        let aligner = BatchAligner::new(SharedSubstitutionModel::default(), 4);
        assert!(aligner.run(&[]).is_empty());
    }

    #[test]
    fn test_zero_workers_clamped_to_one() {
        let model = SharedSubstitutionModel::new(SubstitutionModel::new(1.0));
        let aligner = BatchAligner::new(model, 0);
        assert_eq!(aligner.workers(), 1);
        assert_eq!(aligner.run(&jobs()).len(), 6);
    }

    #[test]
    fn test_job_deserializes_from_json() {
        let json = r#"{
            "query": ["a"],
            "reference": ["a", "b"],
            "word_index": [0, 1],
            "params": {
                "expected_word": 0,
                "prior_weight": 0.005,
                "costs": {"substitution": 1.0, "deletion": 0.8, "insertion": 1.0}
            }
        }"#;
        let job: AlignmentJob = serde_json::from_str(json).unwrap();
        assert_eq!(job.word_index, vec![0, 1]);
    }
}
