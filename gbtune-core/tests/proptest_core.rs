//! Property-based tests for core components using proptest.

use proptest::prelude::*;

use gbtune_core::data::{Dataset, SplitConfig, train_test_split};
use gbtune_core::metrics::ClassificationMetrics;
use gbtune_core::search::ParamGrid;
use gbtune_core::search::cv::stratified_folds;
use gbtune_core::search::space::{grid_candidates, grid_size};
use serde_json::json;
use std::collections::BTreeSet;

fn dataset(labels: &[bool]) -> Dataset {
    Dataset {
        feature_names: vec!["x".into()],
        features: (0..labels.len()).map(|i| vec![i as f64]).collect(),
        labels: labels.to_vec(),
    }
}

// --- Train/test split properties ---

proptest! {
    #[test]
    fn split_partitions_rows(
        n_pos in 3usize..60,
        n_neg in 3usize..60,
        test_size in 0.1f64..0.5,
        seed in any::<u64>(),
        stratify in any::<bool>(),
    ) {
        let labels: Vec<bool> = (0..n_pos + n_neg).map(|i| i < n_pos).collect();
        let data = dataset(&labels);
        let config = SplitConfig { test_size, seed, stratify };
        let split = train_test_split(&data, &config).unwrap();

        let n = labels.len();
        prop_assert_eq!(split.test.len(), (n as f64 * test_size).ceil() as usize);
        prop_assert_eq!(split.train.len() + split.test.len(), n);

        let all: BTreeSet<usize> = split
            .train_indices
            .iter()
            .chain(&split.test_indices)
            .copied()
            .collect();
        prop_assert_eq!(all.len(), n);
    }

    #[test]
    fn split_is_deterministic(n in 10usize..80, seed in any::<u64>()) {
        let labels: Vec<bool> = (0..n).map(|i| i % 3 == 0).collect();
        let data = dataset(&labels);
        let config = SplitConfig { test_size: 0.2, seed, stratify: true };
        let a = train_test_split(&data, &config).unwrap();
        let b = train_test_split(&data, &config).unwrap();
        prop_assert_eq!(a.test_indices, b.test_indices);
    }
}

// --- Stratified fold properties ---

proptest! {
    #[test]
    fn folds_cover_every_row_once(
        labels in prop::collection::vec(any::<bool>(), 20..120),
        k in 2usize..6,
        shuffle in any::<bool>(),
        seed in any::<u64>(),
    ) {
        let positives = labels.iter().filter(|&&l| l).count();
        prop_assume!(positives >= k && labels.len() - positives >= k);

        let folds = stratified_folds(&labels, k, shuffle, seed).unwrap();
        prop_assert_eq!(folds.len(), k);

        let mut seen = vec![0usize; labels.len()];
        for fold in &folds {
            for &i in fold {
                seen[i] += 1;
            }
        }
        prop_assert!(seen.iter().all(|&c| c == 1));

        let sizes: Vec<usize> = folds.iter().map(Vec::len).collect();
        let (min, max) = (sizes.iter().min().unwrap(), sizes.iter().max().unwrap());
        prop_assert!(max - min <= 1);
    }
}

// --- Metric properties ---

proptest! {
    #[test]
    fn metrics_are_bounded(
        pairs in prop::collection::vec((any::<bool>(), any::<bool>()), 1..200),
    ) {
        let (y_true, y_pred): (Vec<bool>, Vec<bool>) = pairs.into_iter().unzip();
        let m = ClassificationMetrics::compute(&y_true, &y_pred);
        for v in [m.accuracy, m.precision, m.recall, m.f1_score] {
            prop_assert!((0.0..=1.0).contains(&v));
        }
        prop_assert_eq!(m.confusion_matrix.total(), y_true.len());
        prop_assert!(m.f1_score <= m.precision.max(m.recall) + 1e-12);
    }

    #[test]
    fn perfect_predictions_score_one(labels in prop::collection::vec(any::<bool>(), 1..100)) {
        prop_assume!(labels.iter().any(|&l| l));
        let m = ClassificationMetrics::compute(&labels, &labels);
        prop_assert_eq!(m.f1_score, 1.0);
        prop_assert_eq!(m.accuracy, 1.0);
    }
}

// --- Grid properties ---

proptest! {
    #[test]
    fn grid_size_is_product(sizes in prop::collection::vec(1usize..5, 1..4)) {
        let grid: ParamGrid = sizes
            .iter()
            .enumerate()
            .map(|(p, &len)| (format!("p{p}"), (0..len).map(|v| json!(v)).collect()))
            .collect();
        let expected: usize = sizes.iter().product();
        prop_assert_eq!(grid_size(&grid).unwrap(), expected);

        let candidates = grid_candidates(&grid);
        prop_assert_eq!(candidates.len(), expected);
        let distinct: BTreeSet<String> = candidates
            .iter()
            .map(|c| serde_json::to_string(c).unwrap())
            .collect();
        prop_assert_eq!(distinct.len(), expected);
    }
}
