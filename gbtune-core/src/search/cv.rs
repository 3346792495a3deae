//! Stratified k-fold cross-validation scoring.

use crate::data::Dataset;
use crate::error::TuneError;
use crate::metrics::f1_score;
use crate::model::{Classifier, GbdtClassifier, GbdtParams};
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Cross-validation options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvConfig {
    #[serde(default = "default_folds")]
    pub folds: usize,
    /// Worker threads for fold evaluation; 0 uses every core.
    #[serde(default)]
    pub n_jobs: usize,
    /// Shuffle rows within each class before assigning folds.
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for CvConfig {
    fn default() -> Self {
        Self {
            folds: default_folds(),
            n_jobs: 0,
            shuffle: false,
            seed: default_seed(),
        }
    }
}

fn default_folds() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

/// Validation-fold row indices for stratified k-fold. Each class is dealt
/// round-robin across folds so every row lands in exactly one fold.
pub fn stratified_folds(
    labels: &[bool],
    k: usize,
    shuffle: bool,
    seed: u64,
) -> Result<Vec<Vec<usize>>, TuneError> {
    if k < 2 {
        return Err(TuneError::split(format!("need at least 2 folds, got {k}")));
    }
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(), Vec::new()];
    for (i, &label) in labels.iter().enumerate() {
        groups[usize::from(label)].push(i);
    }
    let smallest = groups.iter().map(Vec::len).min().unwrap_or(0);
    if smallest < k {
        return Err(TuneError::split(format!(
            "the smallest class has {smallest} rows, fewer than {k} folds"
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut folds = vec![Vec::new(); k];
    let mut offset = 0;
    for group in &mut groups {
        if shuffle {
            group.shuffle(&mut rng);
        }
        for (i, &idx) in group.iter().enumerate() {
            folds[(offset + i) % k].push(idx);
        }
        offset += group.len();
    }
    for fold in &mut folds {
        fold.sort_unstable();
    }
    Ok(folds)
}

struct Fold {
    train: Dataset,
    valid: Dataset,
}

/// Scores hyperparameter assignments by mean validation F1 across folds.
pub struct CrossValidator {
    folds: Vec<Fold>,
    pool: rayon::ThreadPool,
}

impl CrossValidator {
    pub fn new(data: &Dataset, config: &CvConfig) -> Result<Self, TuneError> {
        let validation = stratified_folds(&data.labels, config.folds, config.shuffle, config.seed)?;
        let folds = validation
            .iter()
            .map(|valid_idx| {
                let mut in_valid = vec![false; data.len()];
                for &i in valid_idx {
                    in_valid[i] = true;
                }
                let train_idx: Vec<usize> = (0..data.len()).filter(|&i| !in_valid[i]).collect();
                Fold {
                    train: data.subset(&train_idx),
                    valid: data.subset(valid_idx),
                }
            })
            .collect();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.n_jobs)
            .build()
            .map_err(|e| TuneError::config(format!("Failed to build thread pool: {e}")))?;

        Ok(Self { folds, pool })
    }

    pub fn n_folds(&self) -> usize {
        self.folds.len()
    }

    /// Validation F1 of `params` on one fold.
    pub fn score_fold(&self, params: &GbdtParams, fold: usize) -> Result<f64, TuneError> {
        let fold = &self.folds[fold];
        let mut model = GbdtClassifier::new(params.clone());
        model.fit(&fold.train)?;
        let predictions = model.predict(&fold.valid.features)?;
        Ok(f1_score(&fold.valid.labels, &predictions))
    }

    /// Per-fold F1 for every candidate, evaluated in parallel.
    pub fn score_all(&self, candidates: &[GbdtParams]) -> Result<Vec<Vec<f64>>, TuneError> {
        let k = self.n_folds();
        let jobs: Vec<(usize, usize)> = (0..candidates.len())
            .flat_map(|c| (0..k).map(move |f| (c, f)))
            .collect();

        let scores: Vec<f64> = self.pool.install(|| {
            jobs.par_iter()
                .map(|&(c, f)| self.score_fold(&candidates[c], f))
                .collect::<Result<Vec<f64>, TuneError>>()
        })?;

        Ok(scores.chunks(k).map(<[f64]>::to_vec).collect())
    }
}
