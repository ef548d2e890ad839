//! Data loading utilities
//!
//! Reads a CSV file with a header row into a numeric `Table`.
//! Columns that contain non-numeric values (dates, tickers) are
//! dropped and reported.

use super::table::Table;
use crate::error::{PipelineError, Result};
use csv::ReaderBuilder;
use std::path::Path;
use tracing::{debug, info, warn};

/// Cell tokens treated as missing values (compared case-insensitively).
///
/// Numbers that parse but are not finite (`inf`, `-inf`, overflowing
/// literals such as `1e400`) are also treated as missing.
const MISSING_TOKENS: &[&str] = &["", "na", "nan", "null", "n/a"];

/// Summary of a load
#[derive(Debug, Clone, PartialEq)]
pub struct LoadSummary {
    /// Number of data rows read
    pub rows: usize,
    /// Numeric columns kept
    pub numeric_columns: Vec<String>,
    /// Columns dropped because they hold non-numeric values
    pub skipped_columns: Vec<String>,
}

/// Data loader for CSV files
pub struct DataLoader;

impl DataLoader {
    /// Load a numeric table from a CSV file
    pub fn load_csv<P: AsRef<Path>>(path: P) -> Result<(Table, LoadSummary)> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(PipelineError::InputNotFound {
                path: path.to_path_buf(),
            });
        }

        let unreadable = |source: csv::Error| PipelineError::Unreadable {
            path: path.to_path_buf(),
            source,
        };

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .map_err(unreadable)?;

        let headers: Vec<String> = reader
            .headers()
            .map_err(unreadable)?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let mut raw_rows: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(unreadable)?;
            raw_rows.push(record.iter().map(|s| s.to_string()).collect());
        }

        debug!("Read {} rows from {:?}", raw_rows.len(), path);
        Self::from_records(headers, &raw_rows)
    }

    /// Build a numeric table from header and string records
    pub fn from_records(headers: Vec<String>, records: &[Vec<String>]) -> Result<(Table, LoadSummary)> {
        if records.is_empty() {
            return Err(PipelineError::EmptyDataset(
                "input contains no data rows".to_string(),
            ));
        }

        let mut parsed: Vec<Vec<Option<f64>>> = vec![Vec::with_capacity(headers.len()); records.len()];
        let mut numeric_columns = Vec::new();
        let mut skipped_columns = Vec::new();

        for (col_idx, name) in headers.iter().enumerate() {
            let column: Option<Vec<Option<f64>>> = records
                .iter()
                .map(|record| parse_cell(record.get(col_idx).map(String::as_str).unwrap_or("")))
                .collect();

            match column {
                Some(values) => {
                    numeric_columns.push(name.clone());
                    for (row, value) in parsed.iter_mut().zip(values) {
                        row.push(value);
                    }
                }
                None => {
                    warn!("Skipping non-numeric column '{}'", name);
                    skipped_columns.push(name.clone());
                }
            }
        }

        if numeric_columns.is_empty() {
            return Err(PipelineError::EmptyDataset(
                "input contains no numeric columns".to_string(),
            ));
        }

        info!(
            "Loaded {} rows x {} numeric columns",
            records.len(),
            numeric_columns.len()
        );

        let summary = LoadSummary {
            rows: records.len(),
            numeric_columns: numeric_columns.clone(),
            skipped_columns,
        };

        Ok((Table::new(numeric_columns, parsed)?, summary))
    }
}

/// Parse a single cell.
///
/// Returns `Some(None)` for a missing value, `Some(Some(v))` for a number
/// and `None` when the cell is not numeric at all.
fn parse_cell(raw: &str) -> Option<Option<f64>> {
    let trimmed = raw.trim();
    if MISSING_TOKENS
        .iter()
        .any(|token| trimmed.eq_ignore_ascii_case(token))
    {
        return Some(None);
    }

    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(Some(v)),
        Ok(v) => {
            debug!("Treating non-finite value '{}' ({}) as missing", trimmed, v);
            Some(None)
        }
        Err(_) => None,
    }
}
