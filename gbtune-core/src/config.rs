//! Configuration for gbtune.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace `gbtune.toml` -> explicit `--config` file -> environment
//! (`GBTUNE_` prefix, `__` separates nesting) -> CLI overrides applied by the
//! caller.

use crate::data::SplitConfig;
use crate::error::TuneError;
use crate::model::GbdtParams;
use crate::search::{BayesConfig, CvConfig, GridConfig, RandomConfig, Strategy};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the workspace-level config file.
pub const WORKSPACE_CONFIG: &str = "gbtune.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TuneConfig {
    #[serde(default)]
    pub data: DataConfig,
    /// Base classifier parameters that every search starts from.
    #[serde(default)]
    pub model: GbdtParams,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub cv: CvConfig,
    #[serde(default)]
    pub grid: GridConfig,
    #[serde(default)]
    pub random: RandomConfig,
    #[serde(default)]
    pub bayes: BayesConfig,
}

/// Input data configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV file to load.
    #[serde(default)]
    pub path: Option<PathBuf>,
    /// Response column.
    #[serde(default = "default_target")]
    pub target: String,
    /// Response value treated as positive; the larger value when unset.
    #[serde(default)]
    pub positive_class: Option<f64>,
    /// Feature columns; every non-response column when unset.
    #[serde(default)]
    pub features: Option<Vec<String>>,
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: None,
            target: default_target(),
            positive_class: None,
            features: None,
            delimiter: default_delimiter(),
        }
    }
}

fn default_target() -> String {
    "Channel".to_string()
}

fn default_delimiter() -> char {
    ','
}

impl TuneConfig {
    /// Strategies enabled in this configuration, in run order.
    pub fn enabled_strategies(&self) -> Vec<Strategy> {
        Strategy::ALL
            .into_iter()
            .filter(|s| match s {
                Strategy::Grid => self.grid.enabled,
                Strategy::Random => self.random.enabled,
                Strategy::Bayes => self.bayes.enabled,
            })
            .collect()
    }

    /// Enable exactly the given strategies.
    pub fn restrict_to(&mut self, strategies: &[Strategy]) {
        self.grid.enabled = strategies.contains(&Strategy::Grid);
        self.random.enabled = strategies.contains(&Strategy::Random);
        self.bayes.enabled = strategies.contains(&Strategy::Bayes);
    }

    /// Problems that would make a run fail. Empty when the config is usable.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.data.target.trim().is_empty() {
            errors.push("data.target must not be empty".to_string());
        }
        if !(self.split.test_size > 0.0 && self.split.test_size < 1.0) {
            errors.push(format!(
                "split.test_size must be in (0, 1), got {}",
                self.split.test_size
            ));
        }
        if self.cv.folds < 2 {
            errors.push(format!("cv.folds must be at least 2, got {}", self.cv.folds));
        }
        if self.random.enabled && self.random.n_iter == 0 {
            errors.push("random.n_iter must be at least 1".to_string());
        }
        if self.bayes.enabled && self.bayes.n_trials == 0 {
            errors.push("bayes.n_trials must be at least 1".to_string());
        }
        if self.enabled_strategies().is_empty() {
            errors.push("no search strategy is enabled".to_string());
        }
        errors
    }

    /// Render the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, TuneError> {
        toml::to_string_pretty(self).map_err(|e| TuneError::config(e.to_string()))
    }
}

/// User-level config path (`<config dir>/gbtune/config.toml`).
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "gbtune", "gbtune")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load layered configuration.
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<TuneConfig, TuneError> {
    let mut figment = Figment::from(Serialized::defaults(TuneConfig::default()));

    if let Some(user_config) = user_config_path() {
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(ws) = workspace {
        let ws_config = ws.join(WORKSPACE_CONFIG);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(TuneError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }

    // GBTUNE_CV__FOLDS, GBTUNE_DATA__PATH, etc.
    figment = figment.merge(Env::prefixed("GBTUNE_").split("__"));

    let config: TuneConfig = figment.extract().map_err(Box::new)?;
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}
