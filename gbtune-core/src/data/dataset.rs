//! Binary classification dataset built from a table.

use crate::data::source::Table;
use crate::error::TuneError;
use serde::{Deserialize, Serialize};

/// Dense features with boolean labels (`true` = positive class).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub feature_names: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<bool>,
}

impl Dataset {
    /// Build a dataset from `table`, using `response` as the label column.
    ///
    /// The response must hold exactly two distinct values. `positive_class`
    /// picks the positive one; when unset the larger value is positive.
    /// Every other column becomes a feature unless `features` names a subset.
    pub fn from_table(
        table: &Table,
        response: &str,
        positive_class: Option<f64>,
        features: Option<&[String]>,
    ) -> Result<Self, TuneError> {
        let response_idx = table.column_index(response)?;

        let feature_idx: Vec<usize> = match features {
            Some(names) => names
                .iter()
                .map(|n| {
                    if n == response {
                        Err(TuneError::dataset(format!(
                            "Response column '{response}' cannot also be a feature"
                        )))
                    } else {
                        table.column_index(n)
                    }
                })
                .collect::<Result<_, _>>()?,
            None => (0..table.column_count())
                .filter(|&i| i != response_idx)
                .collect(),
        };
        if feature_idx.is_empty() {
            return Err(TuneError::dataset("No feature columns"));
        }

        let mut classes: Vec<f64> = Vec::new();
        for (row_idx, row) in table.rows.iter().enumerate() {
            let v = row[response_idx].ok_or_else(|| {
                TuneError::dataset(format!("Null response value at row {row_idx}"))
            })?;
            if !classes.contains(&v) {
                classes.push(v);
            }
        }
        if classes.len() != 2 {
            return Err(TuneError::dataset(format!(
                "Response '{response}' must have exactly two classes, found {}",
                classes.len()
            )));
        }
        let positive = match positive_class {
            Some(p) if classes.contains(&p) => p,
            Some(p) => {
                return Err(TuneError::dataset(format!(
                    "Positive class {p} not present in response '{response}'"
                )));
            }
            None => classes[0].max(classes[1]),
        };

        let mut feature_rows = Vec::with_capacity(table.row_count());
        let mut labels = Vec::with_capacity(table.row_count());
        for (row_idx, row) in table.rows.iter().enumerate() {
            let values = feature_idx
                .iter()
                .map(|&i| {
                    row[i].ok_or_else(|| {
                        TuneError::dataset(format!(
                            "Null value in column '{}' at row {row_idx}",
                            table.columns[i]
                        ))
                    })
                })
                .collect::<Result<Vec<f64>, _>>()?;
            feature_rows.push(values);
            labels.push(row[response_idx] == Some(positive));
        }

        Ok(Self {
            feature_names: feature_idx.iter().map(|&i| table.columns[i].clone()).collect(),
            features: feature_rows,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    pub fn positive_count(&self) -> usize {
        self.labels.iter().filter(|&&l| l).count()
    }

    /// Rows at `indices`, in that order.
    pub fn subset(&self, indices: &[usize]) -> Self {
        Self {
            feature_names: self.feature_names.clone(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
        }
    }
}
