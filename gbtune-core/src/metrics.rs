//! Binary classification metrics for the positive class.

use serde::{Deserialize, Serialize};

/// Confusion counts for a binary classifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub false_positive: usize,
    pub true_negative: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    pub fn from_predictions(y_true: &[bool], y_pred: &[bool]) -> Self {
        debug_assert_eq!(y_true.len(), y_pred.len());
        let mut cm = Self::default();
        for (&t, &p) in y_true.iter().zip(y_pred) {
            match (t, p) {
                (true, true) => cm.true_positive += 1,
                (false, true) => cm.false_positive += 1,
                (false, false) => cm.true_negative += 1,
                (true, false) => cm.false_negative += 1,
            }
        }
        cm
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.false_positive + self.true_negative + self.false_negative
    }
}

/// Classification metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub confusion_matrix: ConfusionMatrix,
}

impl ClassificationMetrics {
    /// Metrics for the positive class. A zero denominator yields 0.0.
    pub fn compute(y_true: &[bool], y_pred: &[bool]) -> Self {
        let cm = ConfusionMatrix::from_predictions(y_true, y_pred);
        let tp = cm.true_positive as f64;

        let precision = ratio(tp, tp + cm.false_positive as f64);
        let recall = ratio(tp, tp + cm.false_negative as f64);
        let f1_score = ratio(2.0 * precision * recall, precision + recall);
        let accuracy = ratio(
            (cm.true_positive + cm.true_negative) as f64,
            cm.total() as f64,
        );

        if cm.true_positive + cm.false_positive == 0 {
            tracing::debug!("No positive predictions; precision set to 0.0");
        }

        Self {
            accuracy,
            precision,
            recall,
            f1_score,
            confusion_matrix: cm,
        }
    }
}

fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 { 0.0 } else { num / den }
}

/// F1 score for the positive class.
pub fn f1_score(y_true: &[bool], y_pred: &[bool]) -> f64 {
    ClassificationMetrics::compute(y_true, y_pred).f1_score
}
