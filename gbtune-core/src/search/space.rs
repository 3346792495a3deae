//! Hyperparameter search spaces.

use crate::error::TuneError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One concrete hyperparameter assignment, keyed by parameter name.
pub type Assignment = BTreeMap<String, serde_json::Value>;

/// Discrete grid: parameter name -> candidate values.
pub type ParamGrid = BTreeMap<String, Vec<serde_json::Value>>;

/// Distribution over one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParamDistribution {
    /// Uniform choice among explicit values. A single value is a constant.
    Categorical { choices: Vec<serde_json::Value> },
    /// Integers `low, low + step, ..` up to and including `high`.
    IntRange {
        low: i64,
        high: i64,
        #[serde(default = "default_step")]
        step: i64,
    },
    Uniform { low: f64, high: f64 },
    LogUniform { low: f64, high: f64 },
}

fn default_step() -> i64 {
    1
}

impl ParamDistribution {
    pub fn validate(&self, name: &str) -> Result<(), TuneError> {
        let bad = |reason: String| Err(TuneError::invalid_param(name, reason));
        match self {
            Self::Categorical { choices } if choices.is_empty() => {
                bad("categorical needs at least one choice".into())
            }
            Self::IntRange { step, .. } if *step <= 0 => bad(format!("step {step} must be positive")),
            Self::IntRange { low, high, .. } if low > high => {
                bad(format!("empty integer range [{low}, {high}]"))
            }
            Self::Uniform { low, high } if !(low.is_finite() && high.is_finite() && low < high) => {
                bad(format!("invalid uniform range [{low}, {high}]"))
            }
            Self::LogUniform { low, high } if !(*low > 0.0 && high.is_finite() && low < high) => {
                bad(format!("log-uniform range [{low}, {high}] must be positive and increasing"))
            }
            _ => Ok(()),
        }
    }

    /// Every value when the distribution is discrete.
    pub fn discrete_values(&self) -> Option<Vec<serde_json::Value>> {
        match self {
            Self::Categorical { choices } => Some(choices.clone()),
            Self::IntRange { low, high, step } => Some(
                (0..)
                    .map(|k| low + k * step)
                    .take_while(|v| v <= high)
                    .map(serde_json::Value::from)
                    .collect(),
            ),
            Self::Uniform { .. } | Self::LogUniform { .. } => None,
        }
    }

    /// True for a categorical with exactly one choice.
    pub fn is_constant(&self) -> bool {
        matches!(self, Self::Categorical { choices } if choices.len() == 1)
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> serde_json::Value {
        match self {
            Self::Categorical { choices } => choices[rng.gen_range(0..choices.len())].clone(),
            Self::IntRange { low, high, step } => {
                let n_steps = (high - low) / step;
                serde_json::Value::from(low + rng.gen_range(0..=n_steps) * step)
            }
            Self::Uniform { low, high } => float_value(rng.gen_range(*low..*high)),
            Self::LogUniform { low, high } => {
                float_value(rng.gen_range(low.ln()..high.ln()).exp())
            }
        }
    }
}

/// Parameter spec in a random-search space: a plain list or a distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamSpec {
    List(Vec<serde_json::Value>),
    Distribution(ParamDistribution),
}

impl ParamSpec {
    pub fn into_distribution(self) -> ParamDistribution {
        match self {
            Self::List(choices) => ParamDistribution::Categorical { choices },
            Self::Distribution(d) => d,
        }
    }
}

pub(crate) fn float_value(v: f64) -> serde_json::Value {
    serde_json::Number::from_f64(v)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}

/// Reject empty grids and empty candidate lists.
pub fn validate_grid(grid: &ParamGrid) -> Result<(), TuneError> {
    if grid.is_empty() {
        return Err(TuneError::search("Parameter grid is empty"));
    }
    for (name, values) in grid {
        if values.is_empty() {
            return Err(TuneError::invalid_param(name, "candidate list is empty"));
        }
    }
    Ok(())
}

/// Number of assignments in the Cartesian product of `grid`.
pub fn grid_size(grid: &ParamGrid) -> Result<usize, TuneError> {
    grid.values().try_fold(1usize, |acc, values| {
        acc.checked_mul(values.len())
            .ok_or_else(|| TuneError::search("Parameter grid has too many combinations"))
    })
}

/// Cartesian product of the grid, in parameter-name then list order.
pub fn grid_candidates(grid: &ParamGrid) -> Vec<Assignment> {
    let mut configs = vec![Assignment::new()];
    for (key, values) in grid {
        let mut next = Vec::with_capacity(configs.len() * values.len());
        for config in &configs {
            for value in values {
                let mut c = config.clone();
                c.insert(key.clone(), value.clone());
                next.push(c);
            }
        }
        configs = next;
    }
    configs
}

/// Decode the `idx`-th grid assignment without materializing the product.
pub fn grid_candidate_at(grid: &ParamGrid, mut idx: usize) -> Assignment {
    let mut strides: Vec<(&String, &Vec<serde_json::Value>)> = grid.iter().collect();
    strides.reverse();
    let mut assignment = Assignment::new();
    for (key, values) in strides {
        assignment.insert(key.clone(), values[idx % values.len()].clone());
        idx /= values.len();
    }
    assignment
}

/// Render an assignment as `k=v, k=v`.
pub fn format_assignment(assignment: &Assignment) -> String {
    assignment
        .iter()
        .map(|(k, v)| match v {
            serde_json::Value::String(s) => format!("{k}={s}"),
            other => format!("{k}={other}"),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    fn grid() -> ParamGrid {
        let mut g = ParamGrid::new();
        g.insert("max_depth".into(), vec![json!(2), json!(3)]);
        g.insert("n_estimators".into(), vec![json!(10), json!(20), json!(30)]);
        g
    }

    #[test]
    fn test_grid_candidates_order() {
        let candidates = grid_candidates(&grid());
        assert_eq!(candidates.len(), 6);
        assert_eq!(grid_size(&grid()).unwrap(), 6);
        assert_eq!(candidates[0]["max_depth"], json!(2));
        assert_eq!(candidates[0]["n_estimators"], json!(10));
        assert_eq!(candidates[1]["n_estimators"], json!(20));
        assert_eq!(candidates[5]["max_depth"], json!(3));
    }

    #[test]
    fn test_grid_size_overflow() {
        let values: Vec<serde_json::Value> = (0..1000).map(|v| json!(v)).collect();
        let huge: ParamGrid = (0..8).map(|p| (format!("p{p}"), values.clone())).collect();
        assert!(matches!(grid_size(&huge), Err(TuneError::Search(_))));
    }

    #[test]
    fn test_grid_candidate_at_matches_product() {
        let g = grid();
        let all = grid_candidates(&g);
        for (i, c) in all.iter().enumerate() {
            assert_eq!(&grid_candidate_at(&g, i), c);
        }
    }

    #[test]
    fn test_validate_grid() {
        assert!(validate_grid(&ParamGrid::new()).is_err());
        let mut g = grid();
        g.insert("subsample".into(), vec![]);
        assert!(validate_grid(&g).is_err());
        assert!(validate_grid(&grid()).is_ok());
    }

    #[test]
    fn test_int_range_values() {
        let d = ParamDistribution::IntRange {
            low: 50,
            high: 300,
            step: 50,
        };
        let values = d.discrete_values().unwrap();
        assert_eq!(values, vec![json!(50), json!(100), json!(150), json!(200), json!(250), json!(300)]);
    }

    #[test]
    fn test_sample_within_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let log = ParamDistribution::LogUniform { low: 0.01, high: 0.3 };
        let int = ParamDistribution::IntRange { low: 2, high: 8, step: 2 };
        for _ in 0..200 {
            let v = log.sample(&mut rng).as_f64().unwrap();
            assert!((0.01..0.3).contains(&v));
            let i = int.sample(&mut rng).as_i64().unwrap();
            assert!([2, 4, 6, 8].contains(&i));
        }
    }

    #[test]
    fn test_validate_distribution() {
        assert!(ParamDistribution::LogUniform { low: 0.0, high: 1.0 }.validate("lr").is_err());
        assert!(ParamDistribution::IntRange { low: 5, high: 1, step: 1 }.validate("d").is_err());
        assert!(ParamDistribution::IntRange { low: 1, high: 5, step: 0 }.validate("d").is_err());
        assert!(ParamDistribution::Categorical { choices: vec![] }.validate("c").is_err());
        assert!(ParamDistribution::Uniform { low: 0.5, high: 1.0 }.validate("s").is_ok());
    }

    #[test]
    fn test_param_spec_deserialize() {
        let list: ParamSpec = serde_json::from_value(json!([1, 2, 3])).unwrap();
        assert_eq!(list, ParamSpec::List(vec![json!(1), json!(2), json!(3)]));
        let dist: ParamSpec =
            serde_json::from_value(json!({"type": "log_uniform", "low": 0.01, "high": 0.3})).unwrap();
        assert_eq!(
            dist,
            ParamSpec::Distribution(ParamDistribution::LogUniform { low: 0.01, high: 0.3 })
        );
    }

    #[test]
    fn test_format_assignment() {
        let mut a = Assignment::new();
        a.insert("loss".into(), json!("LogLikelyhood"));
        a.insert("max_depth".into(), json!(3));
        assert_eq!(format_assignment(&a), "loss=LogLikelyhood, max_depth=3");
    }
}
