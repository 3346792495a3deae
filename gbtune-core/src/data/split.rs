//! Seeded train/test partitioning.

use crate::data::dataset::Dataset;
use crate::error::TuneError;
use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Split options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows held out for testing, in (0, 1).
    #[serde(default = "default_test_size")]
    pub test_size: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Keep class proportions equal across both subsets.
    #[serde(default = "default_true")]
    pub stratify: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: default_test_size(),
            seed: default_seed(),
            stratify: true,
        }
    }
}

fn default_test_size() -> f64 {
    0.2
}

fn default_seed() -> u64 {
    42
}

fn default_true() -> bool {
    true
}

/// Train and test subsets plus the source row indices of each.
#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub train: Dataset,
    pub test: Dataset,
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Partition `data` into train/test subsets. The test subset holds
/// `ceil(n * test_size)` rows.
pub fn train_test_split(data: &Dataset, config: &SplitConfig) -> Result<TrainTestSplit, TuneError> {
    let n = data.len();
    if !(config.test_size > 0.0 && config.test_size < 1.0) {
        return Err(TuneError::split(format!(
            "test_size must be in (0, 1), got {}",
            config.test_size
        )));
    }
    let n_test = (n as f64 * config.test_size).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(TuneError::split(format!(
            "test_size {} leaves an empty subset for {n} rows",
            config.test_size
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let (mut train_indices, mut test_indices) = if config.stratify {
        stratified_indices(&data.labels, n_test, &mut rng)
    } else {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut rng);
        let train = indices.split_off(n_test);
        (train, indices)
    };
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    tracing::debug!(
        train = train_indices.len(),
        test = test_indices.len(),
        stratify = config.stratify,
        "Split dataset"
    );

    Ok(TrainTestSplit {
        train: data.subset(&train_indices),
        test: data.subset(&test_indices),
        train_indices,
        test_indices,
    })
}

/// Allocate `n_test` rows across the two classes in proportion to their size,
/// handing leftover rows to the class with the larger fractional share.
fn stratified_indices(
    labels: &[bool],
    n_test: usize,
    rng: &mut ChaCha8Rng,
) -> (Vec<usize>, Vec<usize>) {
    let n = labels.len();
    let mut groups: Vec<Vec<usize>> = vec![Vec::new(), Vec::new()];
    for (i, &label) in labels.iter().enumerate() {
        groups[usize::from(label)].push(i);
    }

    let shares: Vec<f64> = groups
        .iter()
        .map(|g| g.len() as f64 * n_test as f64 / n as f64)
        .collect();
    let mut quotas: Vec<usize> = shares.iter().map(|s| s.floor() as usize).collect();
    let mut remaining = n_test - quotas.iter().sum::<usize>();
    let mut order: Vec<usize> = vec![0, 1];
    order.sort_by(|&a, &b| {
        let fa = shares[a] - shares[a].floor();
        let fb = shares[b] - shares[b].floor();
        fb.total_cmp(&fa)
    });
    for &class in order.iter().cycle() {
        if remaining == 0 {
            break;
        }
        if quotas[class] < groups[class].len() {
            quotas[class] += 1;
            remaining -= 1;
        }
    }

    let mut train = Vec::with_capacity(n - n_test);
    let mut test = Vec::with_capacity(n_test);
    for (group, quota) in groups.iter_mut().zip(quotas) {
        group.shuffle(rng);
        test.extend_from_slice(&group[..quota]);
        train.extend_from_slice(&group[quota..]);
    }
    (train, test)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize, positives: usize) -> Dataset {
        Dataset {
            feature_names: vec!["x".into()],
            features: (0..n).map(|i| vec![i as f64]).collect(),
            labels: (0..n).map(|i| i < positives).collect(),
        }
    }

    #[test]
    fn test_split_sizes() {
        let split = train_test_split(&dataset(440, 142), &SplitConfig::default()).unwrap();
        assert_eq!(split.test.len(), 88);
        assert_eq!(split.train.len(), 352);
    }

    #[test]
    fn test_split_is_partition() {
        let split = train_test_split(&dataset(101, 30), &SplitConfig::default()).unwrap();
        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(&split.test_indices)
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..101).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_deterministic() {
        let data = dataset(50, 20);
        let a = train_test_split(&data, &SplitConfig::default()).unwrap();
        let b = train_test_split(&data, &SplitConfig::default()).unwrap();
        assert_eq!(a.test_indices, b.test_indices);

        let other = SplitConfig {
            seed: 7,
            ..SplitConfig::default()
        };
        let c = train_test_split(&data, &other).unwrap();
        assert_ne!(a.test_indices, c.test_indices);
    }

    #[test]
    fn test_split_stratified_proportions() {
        let split = train_test_split(&dataset(100, 30), &SplitConfig::default()).unwrap();
        assert_eq!(split.test.positive_count(), 6);
        assert_eq!(split.train.positive_count(), 24);
    }

    #[test]
    fn test_split_unstratified() {
        let config = SplitConfig {
            stratify: false,
            ..SplitConfig::default()
        };
        let split = train_test_split(&dataset(10, 5), &config).unwrap();
        assert_eq!(split.test.len(), 2);
    }

    #[test]
    fn test_split_rejects_bad_ratio() {
        for ts in [0.0, 1.0, -0.5, 1.5] {
            let config = SplitConfig {
                test_size: ts,
                ..SplitConfig::default()
            };
            assert!(train_test_split(&dataset(10, 5), &config).is_err());
        }
    }
}
