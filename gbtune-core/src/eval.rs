//! Scoring fitted classifiers on the train and test subsets.

use crate::data::{Dataset, TrainTestSplit};
use crate::error::TuneError;
use crate::metrics::ClassificationMetrics;
use crate::model::Classifier;
use serde::{Deserialize, Serialize};

/// Predictions and positive-class metrics on one subset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    #[serde(skip)]
    pub predictions: Vec<bool>,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub metrics: ClassificationMetrics,
}

/// Predict on `data` and score against its labels.
pub fn evaluate(model: &dyn Classifier, data: &Dataset) -> Result<Evaluation, TuneError> {
    if !model.is_fitted() {
        return Err(TuneError::NotFitted);
    }
    let predictions = model.predict(&data.features)?;
    let metrics = ClassificationMetrics::compute(&data.labels, &predictions);
    Ok(Evaluation {
        predictions,
        precision: metrics.precision,
        recall: metrics.recall,
        f1: metrics.f1_score,
        metrics,
    })
}

pub fn evaluate_train(model: &dyn Classifier, split: &TrainTestSplit) -> Result<Evaluation, TuneError> {
    evaluate(model, &split.train)
}

pub fn evaluate_test(model: &dyn Classifier, split: &TrainTestSplit) -> Result<Evaluation, TuneError> {
    evaluate(model, &split.test)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts positive when the first feature exceeds a threshold.
    struct Threshold(Option<f64>);

    impl Classifier for Threshold {
        fn fit(&mut self, _data: &Dataset) -> Result<(), TuneError> {
            self.0 = Some(0.5);
            Ok(())
        }

        fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, TuneError> {
            let t = self.0.ok_or(TuneError::NotFitted)?;
            Ok(features
                .iter()
                .map(|r| if r[0] > t { 1.0 } else { 0.0 })
                .collect())
        }

        fn is_fitted(&self) -> bool {
            self.0.is_some()
        }
    }

    fn data() -> Dataset {
        Dataset {
            feature_names: vec!["x".into()],
            features: vec![vec![0.1], vec![0.9], vec![0.7], vec![0.2]],
            labels: vec![false, true, false, true],
        }
    }

    #[test]
    fn test_evaluate() {
        let mut model = Threshold(None);
        model.fit(&data()).unwrap();
        let eval = evaluate(&model, &data()).unwrap();
        assert_eq!(eval.predictions, vec![false, true, true, false]);
        assert_eq!(eval.precision, 0.5);
        assert_eq!(eval.recall, 0.5);
        assert_eq!(eval.f1, 0.5);
    }

    #[test]
    fn test_evaluate_unfitted() {
        let model = Threshold(None);
        assert!(matches!(evaluate(&model, &data()), Err(TuneError::NotFitted)));
    }
}
