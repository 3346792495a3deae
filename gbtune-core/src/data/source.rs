//! CSV loading into a numeric table.

use crate::error::TuneError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A numeric table. `None` marks an empty cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<f64>>>,
}

impl Table {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize, TuneError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TuneError::MissingColumn(name.to_string()))
    }

    /// All cells of a column, top to bottom.
    pub fn column(&self, name: &str) -> Result<Vec<Option<f64>>, TuneError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx]).collect())
    }

    /// Parse CSV text. The first non-empty line is the header.
    pub fn parse_csv(content: &str, delimiter: char) -> Result<Self, TuneError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());

        let columns: Vec<String> = lines
            .next()
            .ok_or_else(|| TuneError::dataset("Empty CSV file"))?
            .split(delimiter)
            .map(|s| s.trim().trim_matches('"').to_string())
            .collect();

        let mut rows = Vec::new();
        for (row_idx, line) in lines.enumerate() {
            let cells: Vec<&str> = line.split(delimiter).collect();
            if cells.len() != columns.len() {
                return Err(TuneError::Parse {
                    row: row_idx,
                    column: String::new(),
                    message: format!(
                        "expected {} fields, found {}",
                        columns.len(),
                        cells.len()
                    ),
                });
            }
            let row = cells
                .iter()
                .zip(&columns)
                .map(|(cell, column)| parse_cell(cell, row_idx, column))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(row);
        }

        Ok(Self { columns, rows })
    }
}

fn parse_cell(raw: &str, row: usize, column: &str) -> Result<Option<f64>, TuneError> {
    let s = raw.trim().trim_matches('"');
    if s.is_empty() {
        return Ok(None);
    }
    let value = s.parse::<f64>().map_err(|e| TuneError::Parse {
        row,
        column: column.to_string(),
        message: format!("'{s}': {e}"),
    })?;
    if !value.is_finite() {
        return Err(TuneError::Parse {
            row,
            column: column.to_string(),
            message: format!("'{s}' is not a finite number"),
        });
    }
    Ok(Some(value))
}

/// CSV file data source.
#[derive(Debug, Clone)]
pub struct CsvSource {
    pub path: PathBuf,
    pub delimiter: char,
}

impl CsvSource {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            delimiter: ',',
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub async fn load(&self) -> Result<Table, TuneError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        let table = Table::parse_csv(&content, self.delimiter)?;
        tracing::info!(
            path = %self.path.display(),
            rows = table.row_count(),
            columns = table.column_count(),
            "Loaded CSV"
        );
        Ok(table)
    }
}
