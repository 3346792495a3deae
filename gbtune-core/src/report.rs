//! Comparison of search strategies.

use crate::data::TrainTestSplit;
use crate::error::TuneError;
use crate::eval::{Evaluation, evaluate_test, evaluate_train};
use crate::search::space::{Assignment, format_assignment};
use crate::search::{SearchOutcome, Strategy};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Search outcome plus train/test scores of its refitted model.
#[derive(Debug, Clone, Serialize)]
pub struct TuningOutcome {
    pub strategy: Strategy,
    pub best_params: Assignment,
    pub cv_f1: f64,
    pub n_trials: usize,
    pub n_pruned: usize,
    pub elapsed_secs: f64,
    pub train: Evaluation,
    pub test: Evaluation,
}

impl TuningOutcome {
    pub fn from_search(outcome: &SearchOutcome, split: &TrainTestSplit) -> Result<Self, TuneError> {
        Ok(Self {
            strategy: outcome.strategy,
            best_params: outcome.best_params.clone(),
            cv_f1: outcome.best_score,
            n_trials: outcome.trials.len(),
            n_pruned: outcome.pruned_count(),
            elapsed_secs: outcome.elapsed.as_secs_f64(),
            train: evaluate_train(&outcome.model, split)?,
            test: evaluate_test(&outcome.model, split)?,
        })
    }
}

/// All outcomes of one run, best test F1 first.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub train_rows: usize,
    pub test_rows: usize,
    pub outcomes: Vec<TuningOutcome>,
}

impl ComparisonReport {
    pub fn new(started_at: DateTime<Utc>, split: &TrainTestSplit) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            started_at,
            train_rows: split.train.len(),
            test_rows: split.test.len(),
            outcomes: Vec::new(),
        }
    }

    /// Insert keeping descending test F1; ties keep insertion order.
    pub fn push(&mut self, outcome: TuningOutcome) {
        let pos = self
            .outcomes
            .iter()
            .position(|o| o.test.f1 < outcome.test.f1)
            .unwrap_or(self.outcomes.len());
        self.outcomes.insert(pos, outcome);
    }

    pub fn best(&self) -> Option<&TuningOutcome> {
        self.outcomes.first()
    }

    pub fn to_json(&self) -> Result<String, TuneError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

const HEADERS: [&str; 11] = [
    "strategy", "time (s)", "cv f1", "train p", "train r", "train f1", "test p", "test r",
    "test f1", "trials", "best params",
];

/// First and last columns left-aligned, numeric columns right-aligned.
fn write_row(f: &mut fmt::Formatter<'_>, cells: &[&str], widths: &[usize]) -> fmt::Result {
    let last = cells.len() - 1;
    for (i, (cell, &w)) in cells.iter().zip(widths).enumerate() {
        if i == 0 || i == last {
            write!(f, "{cell:<w$}")?;
        } else {
            write!(f, "{cell:>w$}")?;
        }
        if i < last {
            f.write_str("  ")?;
        }
    }
    writeln!(f)
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows: Vec<[String; 11]> = self
            .outcomes
            .iter()
            .map(|o| {
                let trials = if o.n_pruned > 0 {
                    format!("{} ({} pruned)", o.n_trials, o.n_pruned)
                } else {
                    o.n_trials.to_string()
                };
                [
                    o.strategy.to_string(),
                    format!("{:.2}", o.elapsed_secs),
                    format!("{:.4}", o.cv_f1),
                    format!("{:.4}", o.train.precision),
                    format!("{:.4}", o.train.recall),
                    format!("{:.4}", o.train.f1),
                    format!("{:.4}", o.test.precision),
                    format!("{:.4}", o.test.recall),
                    format!("{:.4}", o.test.f1),
                    trials,
                    format_assignment(&o.best_params),
                ]
            })
            .collect();

        let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
        for row in &rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.len());
            }
        }

        writeln!(
            f,
            "Run {} ({} train / {} test rows)",
            self.run_id, self.train_rows, self.test_rows
        )?;
        write_row(f, &HEADERS, &widths)?;
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        write_row(f, &rule.iter().map(String::as_str).collect::<Vec<_>>(), &widths)?;
        for row in &rows {
            write_row(f, &row.iter().map(String::as_str).collect::<Vec<_>>(), &widths)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ClassificationMetrics;

    fn eval(f1: f64) -> Evaluation {
        let metrics = ClassificationMetrics::compute(&[true], &[true]);
        Evaluation {
            predictions: Vec::new(),
            precision: f1,
            recall: f1,
            f1,
            metrics,
        }
    }

    fn outcome(strategy: Strategy, test_f1: f64) -> TuningOutcome {
        TuningOutcome {
            strategy,
            best_params: Assignment::new(),
            cv_f1: 0.9,
            n_trials: 10,
            n_pruned: 0,
            elapsed_secs: 1.5,
            train: eval(0.95),
            test: eval(test_f1),
        }
    }

    fn report() -> ComparisonReport {
        ComparisonReport {
            run_id: "run".into(),
            started_at: Utc::now(),
            train_rows: 352,
            test_rows: 88,
            outcomes: Vec::new(),
        }
    }

    #[test]
    fn test_push_sorts_by_test_f1() {
        let mut r = report();
        r.push(outcome(Strategy::Grid, 0.90));
        r.push(outcome(Strategy::Random, 0.93));
        r.push(outcome(Strategy::Bayes, 0.90));
        let order: Vec<Strategy> = r.outcomes.iter().map(|o| o.strategy).collect();
        assert_eq!(order, vec![Strategy::Random, Strategy::Grid, Strategy::Bayes]);
        assert_eq!(r.best().unwrap().strategy, Strategy::Random);
    }

    #[test]
    fn test_render_table() {
        let mut r = report();
        r.push(outcome(Strategy::Grid, 0.9222));
        let mut pruned = outcome(Strategy::Bayes, 0.91);
        pruned.n_pruned = 4;
        r.push(pruned);
        let text = r.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[1].starts_with("strategy"));
        assert!(lines[3].starts_with("grid"));
        assert!(lines[3].contains("0.9222"));
        assert!(lines[4].contains("10 (4 pruned)"));
    }

    #[test]
    fn test_to_json() {
        let mut r = report();
        r.push(outcome(Strategy::Grid, 0.9));
        let value: serde_json::Value = serde_json::from_str(&r.to_json().unwrap()).unwrap();
        assert_eq!(value["outcomes"][0]["strategy"], "grid");
        assert_eq!(value["test_rows"], 88);
    }
}
