//! Gradient-boosted tree classifier backed by the `gbdt` crate.

use crate::data::Dataset;
use crate::error::TuneError;
use crate::model::Classifier;
use crate::search::space::Assignment;
use gbdt::config::Config;
use gbdt::decision_tree::{Data, DataVec};
use gbdt::gradient_boost::GBDT;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The only `gbdt` loss that trains a binary classifier on {-1, 1} labels.
pub const BINARY_LOSS: &str = "LogLikelyhood";

/// Hyperparameters understood by [`GbdtClassifier`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GbdtParams {
    pub n_estimators: usize,
    pub max_depth: u32,
    pub learning_rate: f64,
    pub min_samples_leaf: usize,
    /// Row sample ratio per tree.
    pub subsample: f64,
    /// Feature sample ratio per tree.
    pub colsample: f64,
    pub loss: String,
}

impl Default for GbdtParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_leaf: 1,
            subsample: 1.0,
            colsample: 1.0,
            loss: BINARY_LOSS.to_string(),
        }
    }
}

impl GbdtParams {
    /// Names accepted by [`GbdtParams::set`].
    pub const NAMES: [&'static str; 7] = [
        "n_estimators",
        "max_depth",
        "learning_rate",
        "min_samples_leaf",
        "subsample",
        "colsample",
        "loss",
    ];

    /// Copy of `self` with every entry of `assignment` applied.
    pub fn with_assignment(&self, assignment: &Assignment) -> Result<Self, TuneError> {
        let mut params = self.clone();
        for (name, value) in assignment {
            params.set(name, value)?;
        }
        Ok(params)
    }

    /// Set one named hyperparameter from a JSON scalar.
    pub fn set(&mut self, name: &str, value: &serde_json::Value) -> Result<(), TuneError> {
        match name {
            "n_estimators" => self.n_estimators = positive_int(name, value)?,
            "max_depth" => {
                self.max_depth = u32::try_from(positive_int(name, value)?)
                    .map_err(|_| TuneError::invalid_param(name, "too large"))?
            }
            "min_samples_leaf" => self.min_samples_leaf = positive_int(name, value)?,
            "learning_rate" => self.learning_rate = ratio(name, value)?,
            "subsample" => self.subsample = ratio(name, value)?,
            "colsample" => self.colsample = ratio(name, value)?,
            "loss" => {
                let loss = value
                    .as_str()
                    .ok_or_else(|| TuneError::invalid_param(name, "expected a string"))?;
                if loss != BINARY_LOSS {
                    return Err(TuneError::invalid_param(
                        name,
                        format!("'{loss}' is not a binary classification loss"),
                    ));
                }
                self.loss = loss.to_string();
            }
            _ => {
                return Err(TuneError::invalid_param(
                    name,
                    format!("unknown hyperparameter, expected one of {:?}", Self::NAMES),
                ));
            }
        }
        Ok(())
    }

    fn to_config(&self, n_features: usize) -> Config {
        let mut cfg = Config::new();
        cfg.set_feature_size(n_features);
        cfg.set_max_depth(self.max_depth);
        cfg.set_iterations(self.n_estimators);
        cfg.set_shrinkage(self.learning_rate as f32);
        cfg.set_min_leaf_size(self.min_samples_leaf);
        cfg.set_data_sample_ratio(self.subsample);
        cfg.set_feature_sample_ratio(self.colsample);
        cfg.set_loss(&self.loss);
        cfg.set_debug(false);
        cfg.set_training_optimization_level(2);
        cfg
    }
}

fn positive_int(name: &str, value: &serde_json::Value) -> Result<usize, TuneError> {
    let n = match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0 && *f >= 0.0).map(|f| f as u64)),
        _ => None,
    }
    .ok_or_else(|| TuneError::invalid_param(name, format!("expected an integer, got {value}")))?;
    if n == 0 {
        return Err(TuneError::invalid_param(name, "must be at least 1"));
    }
    usize::try_from(n).map_err(|_| TuneError::invalid_param(name, "too large"))
}

fn ratio(name: &str, value: &serde_json::Value) -> Result<f64, TuneError> {
    let v = value
        .as_f64()
        .ok_or_else(|| TuneError::invalid_param(name, format!("expected a number, got {value}")))?;
    if !(v > 0.0 && v <= 1.0) {
        return Err(TuneError::invalid_param(name, format!("{v} is outside (0, 1]")));
    }
    Ok(v)
}

/// Binary classifier over a boosted ensemble of regression trees.
pub struct GbdtClassifier {
    params: GbdtParams,
    n_features: usize,
    model: Option<GBDT>,
}

impl GbdtClassifier {
    pub fn new(params: GbdtParams) -> Self {
        Self {
            params,
            n_features: 0,
            model: None,
        }
    }

    pub fn params(&self) -> &GbdtParams {
        &self.params
    }
}

impl fmt::Debug for GbdtClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GbdtClassifier")
            .field("params", &self.params)
            .field("n_features", &self.n_features)
            .field("fitted", &self.model.is_some())
            .finish()
    }
}

impl Classifier for GbdtClassifier {
    fn fit(&mut self, data: &Dataset) -> Result<(), TuneError> {
        if data.is_empty() {
            return Err(TuneError::model("Cannot fit on an empty dataset"));
        }
        let positives = data.positive_count();
        if positives == 0 || positives == data.len() {
            return Err(TuneError::model(
                "Training data must contain both classes",
            ));
        }

        let mut train: DataVec = data
            .features
            .iter()
            .zip(&data.labels)
            .map(|(row, &label)| {
                let target = if label { 1.0 } else { -1.0 };
                Ok(Data::new_training_data(to_f32(row)?, 1.0, target, None))
            })
            .collect::<Result<_, TuneError>>()?;

        let mut model = GBDT::new(&self.params.to_config(data.n_features()));
        model.fit(&mut train);
        self.n_features = data.n_features();
        self.model = Some(model);
        Ok(())
    }

    fn predict_proba(&self, features: &[Vec<f64>]) -> Result<Vec<f64>, TuneError> {
        let model = self.model.as_ref().ok_or(TuneError::NotFitted)?;
        if let Some(row) = features.iter().find(|r| r.len() != self.n_features) {
            return Err(TuneError::model(format!(
                "Expected {} features, got {}",
                self.n_features,
                row.len()
            )));
        }
        let test: DataVec = features
            .iter()
            .map(|row| Ok(Data::new_test_data(to_f32(row)?, None)))
            .collect::<Result<_, TuneError>>()?;
        Ok(model.predict(&test).into_iter().map(f64::from).collect())
    }

    fn is_fitted(&self) -> bool {
        self.model.is_some()
    }
}

/// Narrow a row to `f32`. Values that would overflow are rejected, since
/// `gbdt` treats `f32::MIN` as a missing value.
fn to_f32(row: &[f64]) -> Result<Vec<f32>, TuneError> {
    row.iter()
        .map(|&v| {
            if v.is_finite() && v.abs() < f64::from(f32::MAX) {
                Ok(v as f32)
            } else {
                Err(TuneError::model(format!(
                    "feature value {v} is outside the f32 range"
                )))
            }
        })
        .collect()
}
