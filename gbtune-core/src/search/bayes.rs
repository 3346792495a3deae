//! Sequential model-based search with tree-structured Parzen estimators.
//!
//! Each non-constant parameter gets its own TPE optimizer from the `tpe`
//! crate. Every finished trial is told back to all of them, so later
//! proposals concentrate where earlier trials scored well. The optimizers
//! minimize, so scores are told negated. The first `n_random_trials` trials
//! draw every parameter independently so the optimizers start from an
//! unbiased history.
//!
//! With pruning enabled, folds are evaluated one at a time and a
//! [`MedianPruner`] can stop a trial early. Pruned trials still inform the
//! sampler through their partial score but are never selected as best.

use crate::error::TuneError;
use crate::model::GbdtParams;
use crate::search::cv::CrossValidator;
use crate::search::pruner::MedianPruner;
use crate::search::space::{Assignment, ParamDistribution, float_value};
use crate::search::trial::{Strategy, Trial, TrialState, mean};
use crate::search::{SearchDriver, space};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

/// TPE search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BayesConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_n_trials")]
    pub n_trials: usize,
    /// Independent random trials before TPE proposals begin.
    #[serde(default = "default_random_trials")]
    pub n_random_trials: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_true")]
    pub pruning: bool,
    #[serde(default = "default_startup")]
    pub n_startup_trials: usize,
    #[serde(default = "default_warmup")]
    pub n_warmup_steps: usize,
    /// Empty means the built-in space.
    #[serde(default)]
    pub params: BTreeMap<String, ParamDistribution>,
}

impl Default for BayesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            n_trials: default_n_trials(),
            n_random_trials: default_random_trials(),
            seed: default_seed(),
            pruning: true,
            n_startup_trials: default_startup(),
            n_warmup_steps: default_warmup(),
            params: BTreeMap::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_n_trials() -> usize {
    100
}

fn default_random_trials() -> usize {
    10
}

fn default_seed() -> u64 {
    42
}

fn default_startup() -> usize {
    5
}

fn default_warmup() -> usize {
    1
}

impl BayesConfig {
    pub fn space(&self) -> BTreeMap<String, ParamDistribution> {
        if self.params.is_empty() {
            default_bayes_space()
        } else {
            self.params.clone()
        }
    }
}

/// Stepped integer ranges, log-uniform shrinkage, and a fixed loss.
pub fn default_bayes_space() -> BTreeMap<String, ParamDistribution> {
    let mut space = BTreeMap::new();
    space.insert(
        "n_estimators".into(),
        ParamDistribution::IntRange {
            low: 50,
            high: 300,
            step: 50,
        },
    );
    space.insert(
        "max_depth".into(),
        ParamDistribution::IntRange {
            low: 2,
            high: 8,
            step: 1,
        },
    );
    space.insert(
        "learning_rate".into(),
        ParamDistribution::LogUniform {
            low: 0.01,
            high: 0.3,
        },
    );
    space.insert(
        "min_samples_leaf".into(),
        ParamDistribution::IntRange {
            low: 1,
            high: 10,
            step: 1,
        },
    );
    space.insert(
        "loss".into(),
        ParamDistribution::Categorical {
            choices: vec![json!("LogLikelyhood")],
        },
    );
    space
}

/// How a parameter value maps to and from the optimizer's continuous space.
#[derive(Debug, Clone)]
enum Encoding {
    Int { low: i64, step: i64, n_steps: i64 },
    Linear,
    Log,
    Choice(Vec<serde_json::Value>),
}

impl Encoding {
    fn decode(&self, x: f64) -> serde_json::Value {
        match self {
            Encoding::Int { low, step, n_steps } => {
                let k = ((x - *low as f64) / *step as f64).round() as i64;
                serde_json::Value::from(low + k.clamp(0, *n_steps) * step)
            }
            Encoding::Linear => float_value(x),
            Encoding::Log => float_value(x.exp()),
            Encoding::Choice(choices) => {
                let idx = (x.max(0.0) as usize).min(choices.len() - 1);
                choices[idx].clone()
            }
        }
    }

    fn encode(&self, value: &serde_json::Value) -> Option<f64> {
        match self {
            Encoding::Int { .. } => value.as_i64().map(|v| v as f64),
            Encoding::Linear => value.as_f64(),
            Encoding::Log => value.as_f64().map(f64::ln),
            Encoding::Choice(choices) => choices.iter().position(|c| c == value).map(|i| i as f64),
        }
    }
}

/// One sampled parameter with its own optimizer.
struct Dimension {
    name: String,
    dist: ParamDistribution,
    encoding: Encoding,
    range: tpe::range::Range,
    optim: tpe::TpeOptimizer,
}

impl Dimension {
    /// Map a value into the optimizer's half-open range.
    fn encode(&self, value: &serde_json::Value) -> Result<f64, TuneError> {
        let x = self.encoding.encode(value).ok_or_else(|| {
            TuneError::search(format!("cannot encode {value} for '{}'", self.name))
        })?;
        let (lo, hi) = (self.range.start(), self.range.end());
        let below_end = hi - hi.abs().max(1.0) * f64::EPSILON;
        Ok(x.clamp(lo, below_end))
    }
}

fn tpe_error(e: impl std::fmt::Display) -> TuneError {
    TuneError::search(format!("TPE sampler: {e}"))
}

/// Running mean after each fold.
fn running_means(scores: &[f64]) -> Vec<f64> {
    (1..=scores.len()).map(|n| mean(&scores[..n])).collect()
}

/// Tree-structured Parzen estimator search.
#[derive(Debug, Clone)]
pub struct BayesSearch {
    space: BTreeMap<String, ParamDistribution>,
    n_trials: usize,
    n_random_trials: usize,
    seed: u64,
    pruner: Option<MedianPruner>,
}

impl BayesSearch {
    pub fn new(
        space: BTreeMap<String, ParamDistribution>,
        n_trials: usize,
        seed: u64,
    ) -> Result<Self, TuneError> {
        if space.is_empty() {
            return Err(TuneError::search("Bayesian search space is empty"));
        }
        if n_trials == 0 {
            return Err(TuneError::search("n_trials must be at least 1"));
        }
        for (name, dist) in &space {
            dist.validate(name)?;
        }
        Ok(Self {
            space,
            n_trials,
            n_random_trials: default_random_trials(),
            seed,
            pruner: None,
        })
    }

    /// Trials drawn independently at random before TPE proposals begin.
    pub fn with_random_trials(mut self, n_random_trials: usize) -> Self {
        self.n_random_trials = n_random_trials;
        self
    }

    pub fn with_pruner(mut self, pruner: MedianPruner) -> Self {
        self.pruner = Some(pruner);
        self
    }

    pub fn from_config(config: &BayesConfig) -> Result<Self, TuneError> {
        let search = Self::new(config.space(), config.n_trials, config.seed)?
            .with_random_trials(config.n_random_trials);
        Ok(if config.pruning {
            search.with_pruner(MedianPruner::new(
                config.n_startup_trials,
                config.n_warmup_steps,
            ))
        } else {
            search
        })
    }

    /// Split the space into constants and sampled dimensions, in name order.
    fn dimensions(&self) -> Result<(Assignment, Vec<Dimension>), TuneError> {
        let mut fixed = Assignment::new();
        let mut dims = Vec::new();
        for (name, dist) in &self.space {
            let (encoding, range, estimator) = match dist {
                ParamDistribution::Categorical { choices } if choices.len() == 1 => {
                    fixed.insert(name.clone(), choices[0].clone());
                    continue;
                }
                ParamDistribution::Categorical { choices } => (
                    Encoding::Choice(choices.clone()),
                    tpe::categorical_range(choices.len()).map_err(tpe_error)?,
                    tpe::histogram_estimator(),
                ),
                ParamDistribution::IntRange { low, high, step } => {
                    let n_steps = (high - low) / step;
                    if n_steps == 0 {
                        fixed.insert(name.clone(), json!(low));
                        continue;
                    }
                    let half = *step as f64 / 2.0;
                    let top = (low + n_steps * step) as f64;
                    (
                        Encoding::Int {
                            low: *low,
                            step: *step,
                            n_steps,
                        },
                        tpe::range(*low as f64 - half, top + half).map_err(tpe_error)?,
                        tpe::parzen_estimator(),
                    )
                }
                ParamDistribution::Uniform { low, high } => (
                    Encoding::Linear,
                    tpe::range(*low, *high).map_err(tpe_error)?,
                    tpe::parzen_estimator(),
                ),
                ParamDistribution::LogUniform { low, high } => (
                    Encoding::Log,
                    tpe::range(low.ln(), high.ln()).map_err(tpe_error)?,
                    tpe::parzen_estimator(),
                ),
            };
            dims.push(Dimension {
                name: name.clone(),
                dist: dist.clone(),
                encoding,
                range,
                optim: tpe::TpeOptimizer::new(estimator, range),
            });
        }
        Ok((fixed, dims))
    }

    /// Score one assignment fold by fold, stopping early when pruned.
    fn evaluate(
        &self,
        params: &GbdtParams,
        cv: &CrossValidator,
        pruner: Option<&MedianPruner>,
    ) -> Result<(Vec<f64>, TrialState), TuneError> {
        let Some(pruner) = pruner else {
            let scores = cv.score_all(std::slice::from_ref(params))?;
            return Ok((scores.into_iter().next().unwrap_or_default(), TrialState::Complete));
        };

        let k = cv.n_folds();
        let mut scores = Vec::with_capacity(k);
        for fold in 0..k {
            scores.push(cv.score_fold(params, fold)?);
            if fold + 1 < k && pruner.should_prune(fold, mean(&scores)) {
                return Ok((scores, TrialState::Pruned));
            }
        }
        Ok((scores, TrialState::Complete))
    }
}

impl SearchDriver for BayesSearch {
    fn strategy(&self) -> Strategy {
        Strategy::Bayes
    }

    fn search(&self, base: &GbdtParams, cv: &CrossValidator) -> Result<Vec<Trial>, TuneError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut pruner = self.pruner.clone();
        let (fixed, mut dims) = self.dimensions()?;

        if dims.is_empty() {
            tracing::warn!("Every Bayesian parameter is constant; all trials are identical");
        }
        tracing::info!(
            n_trials = self.n_trials,
            random_trials = self.n_random_trials.min(self.n_trials),
            sampled = dims.len(),
            fixed = fixed.len(),
            pruning = pruner.is_some(),
            "TPE search"
        );

        let mut trials = Vec::with_capacity(self.n_trials);
        for number in 0..self.n_trials {
            let mut assignment = fixed.clone();
            let mut xs = Vec::with_capacity(dims.len());
            for dim in dims.iter_mut() {
                let x = if number < self.n_random_trials {
                    let value = dim.dist.sample(&mut rng);
                    let x = dim.encode(&value)?;
                    assignment.insert(dim.name.clone(), value);
                    x
                } else {
                    let x = dim.optim.ask(&mut rng).map_err(tpe_error)?;
                    assignment.insert(dim.name.clone(), dim.encoding.decode(x));
                    x
                };
                xs.push(x);
            }

            let params = base.with_assignment(&assignment)?;
            let (fold_scores, state) = self.evaluate(&params, cv, pruner.as_ref())?;
            let trial = Trial::new(number, assignment, fold_scores, state);

            if let Some(p) = pruner.as_mut() {
                if state == TrialState::Complete {
                    p.complete(running_means(&trial.fold_scores));
                }
            }
            for (dim, x) in dims.iter_mut().zip(&xs) {
                dim.optim.tell(*x, -trial.score).map_err(tpe_error)?;
            }

            tracing::debug!(
                number,
                score = trial.score,
                state = ?trial.state,
                folds = trial.fold_scores.len(),
                params = %space::format_assignment(&trial.params),
                "Trial finished"
            );
            trials.push(trial);
        }

        Ok(trials)
    }
}
