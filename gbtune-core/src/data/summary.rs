//! Descriptive statistics for a loaded table.

use crate::data::source::Table;
use crate::error::TuneError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Statistics for a single column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub count: usize,
    pub null_count: usize,
    pub unique_count: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnStats {
    pub fn compute(name: &str, cells: &[Option<f64>]) -> Self {
        let mut values: Vec<f64> = cells.iter().flatten().copied().collect();
        values.sort_by(f64::total_cmp);

        let count = values.len();
        let mut unique = values.clone();
        unique.dedup();

        let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
        let std_dev = mean.filter(|_| count > 1).map(|m| {
            let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
            (ss / (count - 1) as f64).sqrt()
        });

        Self {
            name: name.to_string(),
            count,
            null_count: cells.len() - count,
            unique_count: unique.len(),
            mean,
            std_dev,
            min: values.first().copied(),
            q25: quantile(&values, 0.25),
            median: quantile(&values, 0.5),
            q75: quantile(&values, 0.75),
            max: values.last().copied(),
        }
    }
}

/// Linear-interpolated quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Shape, per-column statistics, and response balance of a table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSummary {
    pub rows: usize,
    pub columns: usize,
    pub response: String,
    pub stats: Vec<ColumnStats>,
    /// Response value (formatted) -> row count.
    pub class_balance: BTreeMap<String, usize>,
}

impl DataSummary {
    pub fn total_nulls(&self) -> usize {
        self.stats.iter().map(|s| s.null_count).sum()
    }
}

/// Summarize a table. Fails when the response column is absent.
pub fn summarize(table: &Table, response: &str) -> Result<DataSummary, TuneError> {
    let response_cells = table.column(response)?;

    let stats = table
        .columns
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let cells: Vec<Option<f64>> = table.rows.iter().map(|row| row[i]).collect();
            ColumnStats::compute(name, &cells)
        })
        .collect();

    let mut class_balance = BTreeMap::new();
    for value in response_cells.iter().flatten() {
        *class_balance.entry(format_value(*value)).or_insert(0) += 1;
    }

    Ok(DataSummary {
        rows: table.row_count(),
        columns: table.column_count(),
        response: response.to_string(),
        stats,
        class_balance,
    })
}

fn format_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{v}")
    }
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string())
}

impl fmt::Display for DataSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape: ({}, {})", self.rows, self.columns)?;
        writeln!(f)?;

        let width = self
            .stats
            .iter()
            .map(|s| s.name.len())
            .max()
            .unwrap_or(6)
            .max(6);
        writeln!(
            f,
            "{:<width$} {:>7} {:>12} {:>12} {:>10} {:>10} {:>10} {:>10} {:>12} {:>6} {:>6}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max", "nulls", "unique"
        )?;
        for s in &self.stats {
            writeln!(
                f,
                "{:<width$} {:>7} {:>12} {:>12} {:>10} {:>10} {:>10} {:>10} {:>12} {:>6} {:>6}",
                s.name,
                s.count,
                fmt_opt(s.mean),
                fmt_opt(s.std_dev),
                fmt_opt(s.min),
                fmt_opt(s.q25),
                fmt_opt(s.median),
                fmt_opt(s.q75),
                fmt_opt(s.max),
                s.null_count,
                s.unique_count
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Response '{}':", self.response)?;
        for (value, count) in &self.class_balance {
            writeln!(f, "  {value}: {count}")?;
        }
        Ok(())
    }
}
