//! # gbtune-core
//!
//! Compares hyperparameter search strategies for a gradient-boosted tree
//! classifier on a small tabular dataset:
//!
//! 1. load a CSV into a numeric [`data::Table`] and summarize it,
//! 2. build a binary [`data::Dataset`] and split it into train/test subsets,
//! 3. tune with grid, random, and TPE search under stratified k-fold
//!    cross-validation optimizing F1,
//! 4. score each refitted model on both subsets and rank by test F1.
//!
//! Boosting is delegated to the `gbdt` crate and TPE sampling to the `tpe`
//! crate.

pub mod config;
pub mod data;
pub mod error;
pub mod eval;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod search;

pub use config::{TuneConfig, load_config};
pub use error::TuneError;
pub use report::{ComparisonReport, TuningOutcome};
pub use search::Strategy;
