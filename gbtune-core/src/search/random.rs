//! Randomized search over lists and distributions.

use crate::error::TuneError;
use crate::model::GbdtParams;
use crate::search::cv::CrossValidator;
use crate::search::space::{self, Assignment, ParamDistribution, ParamGrid, ParamSpec};
use crate::search::trial::{Strategy, Trial};
use crate::search::{SearchDriver, score_candidates};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// Random search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_n_iter")]
    pub n_iter: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Empty means the built-in space.
    #[serde(default)]
    pub params: BTreeMap<String, ParamSpec>,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            n_iter: default_n_iter(),
            seed: default_seed(),
            params: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_n_iter() -> usize {
    10
}

fn default_seed() -> u64 {
    42
}

impl RandomConfig {
    pub fn space(&self) -> BTreeMap<String, ParamSpec> {
        if self.params.is_empty() {
            default_random_space()
        } else {
            self.params.clone()
        }
    }
}

/// Wider lists than the grid, including leaf size.
pub fn default_random_space() -> BTreeMap<String, ParamSpec> {
    let mut space = BTreeMap::new();
    space.insert(
        "n_estimators".into(),
        ParamSpec::List(vec![json!(50), json!(100), json!(150), json!(200), json!(300)]),
    );
    space.insert(
        "max_depth".into(),
        ParamSpec::List((2..=8).map(|d| json!(d)).collect()),
    );
    space.insert(
        "learning_rate".into(),
        ParamSpec::List(vec![json!(0.01), json!(0.05), json!(0.1), json!(0.2), json!(0.3)]),
    );
    space.insert(
        "min_samples_leaf".into(),
        ParamSpec::List(vec![json!(1), json!(2), json!(5), json!(10)]),
    );
    space
}

/// Samples a fixed number of assignments.
#[derive(Debug, Clone)]
pub struct RandomSearch {
    space: BTreeMap<String, ParamDistribution>,
    n_iter: usize,
    seed: u64,
}

impl RandomSearch {
    pub fn new(
        space: BTreeMap<String, ParamSpec>,
        n_iter: usize,
        seed: u64,
    ) -> Result<Self, TuneError> {
        if space.is_empty() {
            return Err(TuneError::search("Random search space is empty"));
        }
        if n_iter == 0 {
            return Err(TuneError::search("n_iter must be at least 1"));
        }
        let space: BTreeMap<String, ParamDistribution> = space
            .into_iter()
            .map(|(name, spec)| (name, spec.into_distribution()))
            .collect();
        for (name, dist) in &space {
            dist.validate(name)?;
        }
        let search = Self {
            space,
            n_iter,
            seed,
        };
        if let Some(grid) = search.as_grid() {
            space::grid_size(&grid)?;
        }
        Ok(search)
    }

    pub fn from_config(config: &RandomConfig) -> Result<Self, TuneError> {
        Self::new(config.space(), config.n_iter, config.seed)
    }

    /// The space as a grid when every parameter is discrete.
    fn as_grid(&self) -> Option<ParamGrid> {
        self.space
            .iter()
            .map(|(name, dist)| match dist {
                ParamDistribution::Categorical { choices } => Some((name.clone(), choices.clone())),
                _ => None,
            })
            .collect()
    }

    /// Draw the assignments to evaluate. Grid spaces are sampled without
    /// replacement, capped at the grid size.
    pub fn sample(&self) -> Result<Vec<Assignment>, TuneError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        Ok(match self.as_grid() {
            Some(grid) => {
                let size = space::grid_size(&grid)?;
                let n = self.n_iter.min(size);
                if n < self.n_iter {
                    tracing::warn!(
                        n_iter = self.n_iter,
                        grid_size = size,
                        "n_iter exceeds grid size; sampling the whole grid"
                    );
                }
                rand::seq::index::sample(&mut rng, size, n)
                    .into_iter()
                    .map(|idx| space::grid_candidate_at(&grid, idx))
                    .collect()
            }
            None => (0..self.n_iter)
                .map(|_| {
                    self.space
                        .iter()
                        .map(|(name, dist)| (name.clone(), dist.sample(&mut rng)))
                        .collect()
                })
                .collect(),
        })
    }
}

impl SearchDriver for RandomSearch {
    fn strategy(&self) -> Strategy {
        Strategy::Random
    }

    fn search(&self, base: &GbdtParams, cv: &CrossValidator) -> Result<Vec<Trial>, TuneError> {
        let candidates = self.sample()?;
        tracing::info!(candidates = candidates.len(), seed = self.seed, "Random search candidates");
        score_candidates(base, cv, candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_distinct_from_grid() {
        let search = RandomSearch::from_config(&RandomConfig::default()).unwrap();
        let samples = search.sample().unwrap();
        assert_eq!(samples.len(), 10);
        for (i, a) in samples.iter().enumerate() {
            assert!(samples[i + 1..].iter().all(|b| a != b));
        }
    }

    #[test]
    fn test_sample_deterministic() {
        let search = RandomSearch::from_config(&RandomConfig::default()).unwrap();
        assert_eq!(search.sample().unwrap(), search.sample().unwrap());
    }

    #[test]
    fn test_sample_capped_at_grid_size() {
        let mut space = BTreeMap::new();
        space.insert("max_depth".to_string(), ParamSpec::List(vec![json!(2), json!(3)]));
        let search = RandomSearch::new(space, 10, 1).unwrap();
        assert_eq!(search.sample().unwrap().len(), 2);
    }

    #[test]
    fn test_sample_with_distribution() {
        let mut space = BTreeMap::new();
        space.insert(
            "learning_rate".to_string(),
            ParamSpec::Distribution(ParamDistribution::LogUniform { low: 0.01, high: 0.3 }),
        );
        space.insert("max_depth".to_string(), ParamSpec::List(vec![json!(3)]));
        let search = RandomSearch::new(space, 25, 9).unwrap();
        let samples = search.sample().unwrap();
        assert_eq!(samples.len(), 25);
        for s in &samples {
            let lr = s["learning_rate"].as_f64().unwrap();
            assert!((0.01..0.3).contains(&lr));
            assert_eq!(s["max_depth"], json!(3));
        }
    }

    #[test]
    fn test_rejects_oversized_grid() {
        let values: Vec<serde_json::Value> = (0..1000).map(|v| json!(v)).collect();
        let space: BTreeMap<String, ParamSpec> = (0..8)
            .map(|p| (format!("p{p}"), ParamSpec::List(values.clone())))
            .collect();
        assert!(matches!(
            RandomSearch::new(space, 10, 0),
            Err(TuneError::Search(_))
        ));
    }

    #[test]
    fn test_rejects_empty() {
        assert!(RandomSearch::new(BTreeMap::new(), 5, 0).is_err());
        assert!(RandomSearch::new(default_random_space(), 0, 0).is_err());
    }
}
