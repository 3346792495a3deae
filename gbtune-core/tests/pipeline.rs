use gbtune_core::config::TuneConfig;
use gbtune_core::data::{CsvSource, summarize};
use gbtune_core::pipeline::{load_table, prepare, run_comparison};
use gbtune_core::search::{ParamDistribution, ParamSpec, Strategy};
use gbtune_core::{ComparisonReport, TuneError};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;

/// Wholesale-shaped CSV where Grocery separates the two channels.
fn write_csv(dir: &Path) -> std::path::PathBuf {
    let mut content = String::from("Channel,Region,Fresh,Milk,Grocery,Frozen\n");
    for i in 0..120u32 {
        let retail = i % 3 == 0;
        let channel = if retail { 2 } else { 1 };
        let region = 1 + i % 3;
        let fresh = 1000 + (i * 97) % 5000;
        let milk = if retail { 4000 + (i * 31) % 3000 } else { 1000 + (i * 29) % 3000 };
        let grocery = if retail { 8000 + (i * 37) % 2000 } else { 1000 + (i * 53) % 2000 };
        let frozen = 200 + (i * 71) % 4000;
        content.push_str(&format!("{channel},{region},{fresh},{milk},{grocery},{frozen}\n"));
    }
    let path = dir.join("wholesale.csv");
    std::fs::write(&path, content).unwrap();
    path
}

fn small_config(path: &Path) -> TuneConfig {
    let mut config = TuneConfig::default();
    config.data.path = Some(path.to_path_buf());
    config.cv.folds = 3;
    config.model.n_estimators = 20;

    config.grid.params = BTreeMap::from([
        ("n_estimators".to_string(), vec![json!(10), json!(20)]),
        ("max_depth".to_string(), vec![json!(2), json!(3)]),
    ]);

    config.random.n_iter = 3;
    config.random.params = BTreeMap::from([
        (
            "max_depth".to_string(),
            ParamSpec::List(vec![json!(2), json!(3), json!(4)]),
        ),
        (
            "learning_rate".to_string(),
            ParamSpec::Distribution(ParamDistribution::Uniform { low: 0.1, high: 0.3 }),
        ),
    ]);

    config.bayes.n_trials = 8;
    config.bayes.n_random_trials = 3;
    config.bayes.n_startup_trials = 3;
    config.bayes.params = BTreeMap::from([
        (
            "n_estimators".to_string(),
            ParamDistribution::IntRange { low: 10, high: 30, step: 10 },
        ),
        (
            "max_depth".to_string(),
            ParamDistribution::IntRange { low: 2, high: 4, step: 1 },
        ),
    ]);
    config
}

async fn run(config: &TuneConfig) -> Result<ComparisonReport, TuneError> {
    let table = load_table(config).await?;
    let split = prepare(&table, config)?;
    run_comparison(&split, config)
}

#[tokio::test]
async fn test_summary_of_loaded_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    let table = CsvSource::new(&path).load().await.unwrap();

    let summary = summarize(&table, "Channel").unwrap();
    assert_eq!(summary.rows, 120);
    assert_eq!(summary.columns, 6);
    assert_eq!(summary.total_nulls(), 0);
    assert_eq!(summary.class_balance.values().sum::<usize>(), 120);
    assert_eq!(summary.class_balance.len(), 2);
}

#[tokio::test]
async fn test_full_comparison() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    let config = small_config(&path);

    let report = run(&config).await.unwrap();
    assert_eq!(report.train_rows + report.test_rows, 120);
    assert_eq!(report.test_rows, 24);
    assert_eq!(report.outcomes.len(), 3);

    for pair in report.outcomes.windows(2) {
        assert!(pair[0].test.f1 >= pair[1].test.f1);
    }

    for outcome in &report.outcomes {
        assert!(outcome.test.f1 > 0.8, "{} scored {}", outcome.strategy, outcome.test.f1);
        assert!(outcome.cv_f1 > 0.8);
        match outcome.strategy {
            Strategy::Grid => assert_eq!(outcome.n_trials, 4),
            Strategy::Random => assert_eq!(outcome.n_trials, 3),
            Strategy::Bayes => {
                assert_eq!(outcome.n_trials, 8);
                assert!(outcome.n_pruned < 8);
            }
        }
    }

    let text = report.to_string();
    assert!(text.contains("grid"));
    assert!(text.contains("bayes"));
    let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
    assert_eq!(json["outcomes"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_single_strategy() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    let mut config = small_config(&path);
    config.restrict_to(&[Strategy::Grid]);

    let report = run(&config).await.unwrap();
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.best().unwrap().strategy, Strategy::Grid);
}

#[tokio::test]
async fn test_missing_target_column() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_csv(dir.path());
    let mut config = small_config(&path);
    config.data.target = "Segment".to_string();

    let err = run(&config).await.unwrap_err();
    assert!(matches!(err, TuneError::MissingColumn(ref c) if c == "Segment"));
}

#[tokio::test]
async fn test_no_data_path() {
    let config = TuneConfig::default();
    assert!(matches!(load_table(&config).await, Err(TuneError::Config(_))));
}

#[tokio::test]
async fn test_non_finite_cell_is_a_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    std::fs::write(&path, "Channel,Milk\n1,3\n2,5\n2,NaN\n").unwrap();
    let mut config = TuneConfig::default();
    config.data.path = Some(path);

    let err = load_table(&config).await.unwrap_err();
    assert!(matches!(err, TuneError::Parse { row: 2, ref column, .. } if column == "Milk"));
}
