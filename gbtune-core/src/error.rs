//! Error types for the gbtune-core crate.

use thiserror::Error;

/// Top-level error type for tuning operations.
#[derive(Debug, Error)]
pub enum TuneError {
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Column not found: {0}")]
    MissingColumn(String),

    #[error("Parse error at row {row}, column '{column}': {message}")]
    Parse {
        row: usize,
        column: String,
        message: String,
    },

    #[error("Split error: {0}")]
    Split(String),

    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParam { name: String, reason: String },

    #[error("Model error: {0}")]
    Model(String),

    #[error("Model has not been fitted")]
    NotFitted,

    #[error("Search error: {0}")]
    Search(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl TuneError {
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    pub fn split(msg: impl Into<String>) -> Self {
        Self::Split(msg.into())
    }

    pub fn invalid_param(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParam {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }

    pub fn search(msg: impl Into<String>) -> Self {
        Self::Search(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<Box<figment::Error>> for TuneError {
    fn from(err: Box<figment::Error>) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T, E = TuneError> = std::result::Result<T, E>;
