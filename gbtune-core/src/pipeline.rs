//! End-to-end comparison: load, split, search with every enabled strategy,
//! evaluate, and collect a report.

use crate::config::TuneConfig;
use crate::data::{CsvSource, Dataset, Table, TrainTestSplit, train_test_split};
use crate::error::TuneError;
use crate::report::{ComparisonReport, TuningOutcome};
use crate::search::{
    BayesSearch, CrossValidator, GridSearch, RandomSearch, SearchDriver, Strategy, run_driver,
};
use std::path::PathBuf;

/// Load the configured CSV.
pub async fn load_table(config: &TuneConfig) -> Result<Table, TuneError> {
    let path: &PathBuf = config
        .data
        .path
        .as_ref()
        .ok_or_else(|| TuneError::config("no data path configured (set data.path or --data)"))?;
    CsvSource::new(path)
        .with_delimiter(config.data.delimiter)
        .load()
        .await
}

/// Build the dataset and split it.
pub fn prepare(table: &Table, config: &TuneConfig) -> Result<TrainTestSplit, TuneError> {
    let dataset = Dataset::from_table(
        table,
        &config.data.target,
        config.data.positive_class,
        config.data.features.as_deref(),
    )?;
    tracing::info!(
        rows = dataset.len(),
        features = dataset.n_features(),
        positives = dataset.positive_count(),
        "Built dataset"
    );
    train_test_split(&dataset, &config.split)
}

/// Driver for `strategy` built from its config section.
pub fn build_driver(
    strategy: Strategy,
    config: &TuneConfig,
) -> Result<Box<dyn SearchDriver>, TuneError> {
    Ok(match strategy {
        Strategy::Grid => Box::new(GridSearch::from_config(&config.grid)?),
        Strategy::Random => Box::new(RandomSearch::from_config(&config.random)?),
        Strategy::Bayes => Box::new(BayesSearch::from_config(&config.bayes)?),
    })
}

/// Run every enabled strategy on `split` and rank them by test F1.
pub fn run_comparison(
    split: &TrainTestSplit,
    config: &TuneConfig,
) -> Result<ComparisonReport, TuneError> {
    let problems = config.validate();
    if !problems.is_empty() {
        return Err(TuneError::config(problems.join("; ")));
    }

    let mut report = ComparisonReport::new(chrono::Utc::now(), split);
    let cv = CrossValidator::new(&split.train, &config.cv)?;

    for strategy in config.enabled_strategies() {
        let driver = build_driver(strategy, config)?;
        let outcome = run_driver(driver.as_ref(), &config.model, &split.train, &cv)?;
        let tuned = TuningOutcome::from_search(&outcome, split)?;
        tracing::info!(
            %strategy,
            train_f1 = tuned.train.f1,
            test_f1 = tuned.test.f1,
            "Evaluated best model"
        );
        report.push(tuned);
    }

    Ok(report)
}
