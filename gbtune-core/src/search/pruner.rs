//! Median pruning of unpromising trials.

use serde::{Deserialize, Serialize};

/// Prunes a trial when its running score at a step falls below the median
/// of completed trials at the same step. Higher scores are better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedianPruner {
    /// Completed trials required before pruning starts.
    pub n_startup_trials: usize,
    /// Steps (0-based) that are never pruned.
    pub n_warmup_steps: usize,
    /// Running scores of each completed trial, indexed by step.
    #[serde(skip)]
    history: Vec<Vec<f64>>,
}

impl MedianPruner {
    pub fn new(n_startup_trials: usize, n_warmup_steps: usize) -> Self {
        Self {
            n_startup_trials,
            n_warmup_steps,
            history: Vec::new(),
        }
    }

    /// Record the running scores of a trial that ran to completion.
    pub fn complete(&mut self, running_scores: Vec<f64>) {
        self.history.push(running_scores);
    }

    pub fn completed(&self) -> usize {
        self.history.len()
    }

    pub fn should_prune(&self, step: usize, value: f64) -> bool {
        if self.history.len() < self.n_startup_trials || step < self.n_warmup_steps {
            return false;
        }
        let mut values: Vec<f64> = self
            .history
            .iter()
            .filter_map(|trial| trial.get(step).copied())
            .collect();
        if values.is_empty() {
            return false;
        }
        values.sort_by(f64::total_cmp);
        let mid = values.len() / 2;
        let median = if values.len() % 2 == 0 {
            (values[mid - 1] + values[mid]) / 2.0
        } else {
            values[mid]
        };
        value < median
    }
}
