//! Data loading, summary statistics, and train/test partitioning.

pub mod dataset;
pub mod source;
pub mod split;
pub mod summary;

pub use dataset::Dataset;
pub use source::{CsvSource, Table};
pub use split::{SplitConfig, TrainTestSplit, train_test_split};
pub use summary::{ColumnStats, DataSummary, summarize};
