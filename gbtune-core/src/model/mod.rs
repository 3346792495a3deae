//! Classifier abstraction and the gradient-boosted tree implementation.

pub mod boosted;

pub use boosted::{GbdtClassifier, GbdtParams};

use crate::data::Dataset;
use crate::error::TuneError;

/// A binary classifier that can be trained and queried.
pub trait Classifier {
    /// Train on `data`, replacing any previous fit.
    fn fit(&mut self, data: &Dataset) -> Result<(), TuneError>;

    /// Positive-class probability per row.
    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, TuneError>;

    /// Hard predictions at the 0.5 threshold.
    fn predict(&self, features: &[Vec<f64>]) -> Result<Vec<bool>, TuneError> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| p > 0.5)
            .collect())
    }

    fn is_fitted(&self) -> bool;
}
