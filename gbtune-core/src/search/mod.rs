//! Hyperparameter search drivers: exhaustive grid, randomized, and TPE.
//!
//! Every driver proposes assignments, scores them with stratified k-fold
//! cross-validation on the training subset (mean F1), and hands back its
//! trials. [`run_driver`] times the search, picks the best complete trial,
//! and refits that assignment on the whole training subset.

pub mod bayes;
pub mod cv;
pub mod grid;
pub mod pruner;
pub mod random;
pub mod space;
pub mod trial;

pub use bayes::{BayesConfig, BayesSearch};
pub use cv::{CrossValidator, CvConfig};
pub use grid::{GridConfig, GridSearch};
pub use pruner::MedianPruner;
pub use random::{RandomConfig, RandomSearch};
pub use space::{Assignment, ParamDistribution, ParamGrid, ParamSpec};
pub use trial::{SearchOutcome, Strategy, Trial, TrialState};

use crate::data::Dataset;
use crate::error::TuneError;
use crate::model::{Classifier, GbdtClassifier, GbdtParams};
use std::time::Instant;

/// A search strategy that produces scored trials.
pub trait SearchDriver {
    fn strategy(&self) -> Strategy;

    /// Propose and score assignments on top of `base`.
    fn search(&self, base: &GbdtParams, cv: &CrossValidator) -> Result<Vec<Trial>, TuneError>;
}

/// Run `driver`, then refit its best assignment on `train`.
pub fn run_driver(
    driver: &dyn SearchDriver,
    base: &GbdtParams,
    train: &Dataset,
    cv: &CrossValidator,
) -> Result<SearchOutcome, TuneError> {
    let strategy = driver.strategy();
    tracing::info!(%strategy, folds = cv.n_folds(), "Starting search");
    let started = Instant::now();

    let trials = driver.search(base, cv)?;
    let best = trial::best_trial_index(&trials).ok_or_else(|| {
        TuneError::search(format!("{strategy} search finished without a complete trial"))
    })?;
    let best_params = trials[best].params.clone();
    let best_score = trials[best].score;

    let mut model = GbdtClassifier::new(base.with_assignment(&best_params)?);
    model.fit(train)?;
    let elapsed = started.elapsed();

    tracing::info!(
        %strategy,
        trials = trials.len(),
        best_trial = trials[best].number,
        best_score,
        elapsed_secs = elapsed.as_secs_f64(),
        params = %space::format_assignment(&best_params),
        "Search finished"
    );

    Ok(SearchOutcome {
        strategy,
        best_params,
        best_score,
        trials,
        elapsed,
        model,
    })
}

/// Resolve assignments into classifier parameters, failing on the first invalid one.
pub(crate) fn resolve_all(
    base: &GbdtParams,
    assignments: &[Assignment],
) -> Result<Vec<GbdtParams>, TuneError> {
    assignments.iter().map(|a| base.with_assignment(a)).collect()
}

/// Score assignments in parallel and wrap them as complete trials.
pub(crate) fn score_candidates(
    base: &GbdtParams,
    cv: &CrossValidator,
    assignments: Vec<Assignment>,
) -> Result<Vec<Trial>, TuneError> {
    let params = resolve_all(base, &assignments)?;
    let scores = cv.score_all(&params)?;
    Ok(assignments
        .into_iter()
        .zip(scores)
        .enumerate()
        .map(|(number, (assignment, folds))| {
            let trial = Trial::new(number, assignment, folds, TrialState::Complete);
            tracing::debug!(
                number,
                score = trial.score,
                std = trial.score_std(),
                params = %space::format_assignment(&trial.params),
                "Trial scored"
            );
            trial
        })
        .collect())
}
