//! Exhaustive grid search.

use crate::error::TuneError;
use crate::model::GbdtParams;
use crate::search::cv::CrossValidator;
use crate::search::space::{self, ParamGrid};
use crate::search::trial::{Strategy, Trial};
use crate::search::{SearchDriver, score_candidates};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Grid search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Empty means the built-in grid.
    #[serde(default)]
    pub params: ParamGrid,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            params: ParamGrid::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

impl GridConfig {
    pub fn space(&self) -> ParamGrid {
        if self.params.is_empty() {
            default_grid()
        } else {
            self.params.clone()
        }
    }
}

/// 27 combinations over tree count, depth, and shrinkage.
pub fn default_grid() -> ParamGrid {
    let mut grid = ParamGrid::new();
    grid.insert("n_estimators".into(), vec![json!(50), json!(100), json!(200)]);
    grid.insert("max_depth".into(), vec![json!(3), json!(5), json!(7)]);
    grid.insert("learning_rate".into(), vec![json!(0.01), json!(0.1), json!(0.3)]);
    grid
}

/// Evaluates every combination of the grid.
#[derive(Debug, Clone)]
pub struct GridSearch {
    grid: ParamGrid,
    size: usize,
}

impl GridSearch {
    pub fn new(grid: ParamGrid) -> Result<Self, TuneError> {
        space::validate_grid(&grid)?;
        let size = space::grid_size(&grid)?;
        Ok(Self { grid, size })
    }

    pub fn from_config(config: &GridConfig) -> Result<Self, TuneError> {
        Self::new(config.space())
    }

    pub fn n_candidates(&self) -> usize {
        self.size
    }
}

impl SearchDriver for GridSearch {
    fn strategy(&self) -> Strategy {
        Strategy::Grid
    }

    fn search(&self, base: &GbdtParams, cv: &CrossValidator) -> Result<Vec<Trial>, TuneError> {
        let candidates = space::grid_candidates(&self.grid);
        tracing::info!(candidates = candidates.len(), "Grid search candidates");
        score_candidates(base, cv, candidates)
    }
}
