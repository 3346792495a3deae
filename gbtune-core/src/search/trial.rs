//! Trial records and search outcomes.

use crate::model::GbdtClassifier;
use crate::search::space::Assignment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Search strategy identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Grid,
    Random,
    Bayes,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Grid, Strategy::Random, Strategy::Bayes];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Strategy::Grid => "grid",
            Strategy::Random => "random",
            Strategy::Bayes => "bayes",
        };
        f.write_str(s)
    }
}

impl std::str::FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(Strategy::Grid),
            "random" => Ok(Strategy::Random),
            "bayes" | "bayesian" | "tpe" => Ok(Strategy::Bayes),
            other => Err(format!("unknown strategy '{other}' (expected grid, random, bayes)")),
        }
    }
}

/// Trial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialState {
    Complete,
    Pruned,
}

/// A scored hyperparameter assignment. Immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub number: usize,
    pub params: Assignment,
    /// F1 per evaluated fold; shorter than the fold count when pruned.
    pub fold_scores: Vec<f64>,
    pub score: f64,
    pub state: TrialState,
}

impl Trial {
    pub fn new(number: usize, params: Assignment, fold_scores: Vec<f64>, state: TrialState) -> Self {
        let score = mean(&fold_scores);
        Self {
            number,
            params,
            fold_scores,
            score,
            state,
        }
    }

    pub fn score_std(&self) -> f64 {
        std_dev(&self.fold_scores)
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Index of the best complete trial; ties keep the earliest.
pub fn best_trial_index(trials: &[Trial]) -> Option<usize> {
    trials
        .iter()
        .enumerate()
        .filter(|(_, t)| t.state == TrialState::Complete)
        .fold(None, |best: Option<(usize, f64)>, (i, t)| match best {
            Some((_, s)) if s >= t.score => best,
            _ => Some((i, t.score)),
        })
        .map(|(i, _)| i)
}

/// Result of one search driver.
#[derive(Debug, Serialize)]
pub struct SearchOutcome {
    pub strategy: Strategy,
    pub best_params: Assignment,
    pub best_score: f64,
    pub trials: Vec<Trial>,
    pub elapsed: Duration,
    /// Best assignment refit on the full training subset.
    #[serde(skip)]
    pub model: GbdtClassifier,
}

impl SearchOutcome {
    pub fn pruned_count(&self) -> usize {
        self.trials
            .iter()
            .filter(|t| t.state == TrialState::Pruned)
            .count()
    }
}
