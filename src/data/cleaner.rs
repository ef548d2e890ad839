//! Data cleaning
//!
//! Drops rows with missing values, then exact duplicate rows, and
//! flags runs that lose too much of the input.

use super::table::{Frame, Table};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, warn};

/// Default minimum share of rows that must survive cleaning
pub const DEFAULT_LOSS_WARNING_THRESHOLD: f64 = 0.7;

/// Non-fatal data quality problems
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QualityWarning {
    /// Fewer than `threshold` of the original rows survived cleaning
    ExcessiveDataLoss { retained_ratio: f64, threshold: f64 },
}

impl std::fmt::Display for QualityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityWarning::ExcessiveDataLoss {
                retained_ratio,
                threshold,
            } => write!(
                f,
                "excessive data loss: {:.1}% of rows retained (threshold {:.1}%)",
                retained_ratio * 100.0,
                threshold * 100.0
            ),
        }
    }
}

/// Row counts before and after cleaning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleaningSummary {
    pub original_rows: usize,
    pub removed_missing: usize,
    pub removed_duplicates: usize,
    pub final_rows: usize,
    pub warning: Option<QualityWarning>,
}

impl CleaningSummary {
    /// Share of original rows that survived
    pub fn retained_ratio(&self) -> f64 {
        if self.original_rows == 0 {
            return 0.0;
        }
        self.final_rows as f64 / self.original_rows as f64
    }
}

/// Removes incomplete and duplicate rows
#[derive(Debug, Clone)]
pub struct Cleaner {
    loss_warning_threshold: f64,
}

impl Default for Cleaner {
    fn default() -> Self {
        Self::new(DEFAULT_LOSS_WARNING_THRESHOLD)
    }
}

impl Cleaner {
    pub fn new(loss_warning_threshold: f64) -> Self {
        Self {
            loss_warning_threshold,
        }
    }

    /// Clean a raw table into a dense frame
    pub fn clean(&self, table: &Table) -> Result<(Frame, CleaningSummary)> {
        let original_rows = table.n_rows();

        let complete: Vec<Vec<f64>> = table
            .rows()
            .iter()
            .filter_map(|row| row.iter().copied().collect::<Option<Vec<f64>>>())
            .collect();
        let removed_missing = original_rows - complete.len();

        // Bitwise keys so that equal floats hash equally
        let mut seen: HashSet<Vec<u64>> = HashSet::with_capacity(complete.len());
        let unique: Vec<Vec<f64>> = complete
            .into_iter()
            .filter(|row| seen.insert(row.iter().map(|v| v.to_bits()).collect()))
            .collect();
        let removed_duplicates = original_rows - removed_missing - unique.len();

        if unique.is_empty() {
            return Err(PipelineError::EmptyDataset(
                "no rows remain after removing missing values and duplicates".to_string(),
            ));
        }

        let mut summary = CleaningSummary {
            original_rows,
            removed_missing,
            removed_duplicates,
            final_rows: unique.len(),
            warning: None,
        };

        info!(
            "Cleaning: {} -> {} rows ({} with missing values, {} duplicates)",
            original_rows, summary.final_rows, removed_missing, removed_duplicates
        );

        let retained_ratio = summary.retained_ratio();
        if retained_ratio < self.loss_warning_threshold {
            let warning = QualityWarning::ExcessiveDataLoss {
                retained_ratio,
                threshold: self.loss_warning_threshold,
            };
            warn!("Data quality: {}", warning);
            summary.warning = Some(warning);
        }

        let frame = Frame::from_rows(table.columns().to_vec(), &unique)?;
        Ok((frame, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<Option<f64>>>) -> Table {
        Table::new(vec!["a".to_string(), "b".to_string()], rows).unwrap()
    }

    #[test]
    fn test_removes_missing_then_duplicates() {
        let raw = table(vec![
            vec![Some(1.0), Some(2.0)],
            vec![Some(1.0), Some(2.0)],
            vec![None, Some(2.0)],
            vec![Some(3.0), Some(4.0)],
            vec![Some(3.0), None],
        ]);

        let (frame, summary) = Cleaner::default().clean(&raw).unwrap();

        assert_eq!(frame.n_rows(), 2);
        assert_eq!(summary.removed_missing, 2);
        assert_eq!(summary.removed_duplicates, 1);
        assert_eq!(summary.final_rows, 2);
        assert!(frame.values().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_no_duplicates_survive() {
        let raw = table(vec![
            vec![Some(1.0), Some(1.0)],
            vec![Some(2.0), Some(2.0)],
            vec![Some(1.0), Some(1.0)],
            vec![Some(2.0), Some(2.0)],
            vec![Some(1.0), Some(2.0)],
        ]);

        let (frame, _) = Cleaner::default().clean(&raw).unwrap();
        let rows: Vec<Vec<f64>> = frame.values().rows().into_iter().map(|r| r.to_vec()).collect();
        for i in 0..rows.len() {
            for j in (i + 1)..rows.len() {
                assert_ne!(rows[i], rows[j]);
            }
        }
        // First occurrence order is preserved
        assert_eq!(rows[0], vec![1.0, 1.0]);
    }

    #[test]
    fn test_excessive_loss_is_a_warning() {
        let raw = table(vec![
            vec![Some(1.0), Some(2.0)],
            vec![None, Some(2.0)],
            vec![None, Some(3.0)],
            vec![Some(5.0), Some(6.0)],
        ]);

        let (frame, summary) = Cleaner::default().clean(&raw).unwrap();

        assert_eq!(frame.n_rows(), 2);
        assert!(matches!(
            summary.warning,
            Some(QualityWarning::ExcessiveDataLoss { .. })
        ));
        assert!((summary.retained_ratio() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_all_rows_missing_is_fatal() {
        let raw = table(vec![vec![None, Some(1.0)], vec![Some(1.0), None]]);
        assert!(matches!(
            Cleaner::default().clean(&raw),
            Err(PipelineError::EmptyDataset(_))
        ));
    }
}
