//! Standardization with retained parameters
//!
//! The fitted `NormalizationParams` are the single source of truth for
//! scaling: the pipeline normalizes training data with them and the
//! predictor reuses them for new records and for mapping predictions
//! back to original units.

use super::stats::sample_std;
use super::table::Frame;
use crate::error::{PipelineError, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Mean and standard deviation used to standardize one column
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    pub mean: f64,
    pub std_dev: f64,
}

impl ColumnScale {
    /// (value - mean) / sd
    pub fn normalize(&self, value: f64) -> f64 {
        (value - self.mean) / self.std_dev
    }

    /// value * sd + mean
    pub fn denormalize(&self, value: f64) -> f64 {
        value * self.std_dev + self.mean
    }
}

/// Per-column scaling parameters in column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizationParams {
    columns: Vec<(String, ColumnScale)>,
}

impl NormalizationParams {
    pub fn new(columns: Vec<(String, ColumnScale)>) -> Self {
        Self { columns }
    }

    /// Scale for a column
    pub fn get(&self, column: &str) -> Result<&ColumnScale> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, scale)| scale)
            .ok_or_else(|| PipelineError::MissingColumn(column.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ColumnScale)> {
        self.columns.iter().map(|(name, scale)| (name.as_str(), scale))
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Standardize a single value of a column
    pub fn normalize_value(&self, column: &str, value: f64) -> Result<f64> {
        Ok(self.get(column)?.normalize(value))
    }

    /// Map a standardized value of a column back to original units
    pub fn denormalize_value(&self, column: &str, value: f64) -> Result<f64> {
        Ok(self.get(column)?.denormalize(value))
    }

    /// Standardize every column of a frame
    pub fn transform(&self, frame: &Frame) -> Result<Frame> {
        self.map_columns(frame, ColumnScale::normalize)
    }

    /// Undo `transform`
    pub fn inverse_transform(&self, frame: &Frame) -> Result<Frame> {
        self.map_columns(frame, ColumnScale::denormalize)
    }

    fn map_columns(&self, frame: &Frame, f: fn(&ColumnScale, f64) -> f64) -> Result<Frame> {
        let scales = frame
            .columns()
            .iter()
            .map(|c| self.get(c).copied())
            .collect::<Result<Vec<_>>>()?;

        let mut values: Array2<f64> = frame.values().clone();
        for (mut col, scale) in values.columns_mut().into_iter().zip(&scales) {
            col.mapv_inplace(|v| f(scale, v));
        }

        Frame::new(frame.columns().to_vec(), values)
    }
}

/// Fits standardization parameters
pub struct Normalizer;

impl Normalizer {
    /// Compute mean and sample standard deviation for every column.
    ///
    /// Fails on constant columns, which cannot be standardized.
    pub fn fit(frame: &Frame) -> Result<NormalizationParams> {
        if frame.n_rows() < 2 {
            return Err(PipelineError::insufficient_data(format!(
                "normalization needs at least 2 rows, got {}",
                frame.n_rows()
            )));
        }

        let mut columns = Vec::with_capacity(frame.n_cols());
        for (name, col) in frame.columns().iter().zip(frame.values().columns()) {
            let values = col.to_vec();
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            let std_dev = sample_std(&values, mean);

            if std_dev == 0.0 {
                return Err(PipelineError::ConstantColumn {
                    column: name.clone(),
                });
            }

            debug!("Scale for '{}': mean={:.6}, sd={:.6}", name, mean, std_dev);
            columns.push((name.clone(), ColumnScale { mean, std_dev }));
        }

        Ok(NormalizationParams::new(columns))
    }

    /// Fit on a frame and return it standardized together with the params
    pub fn fit_transform(frame: &Frame) -> Result<(Frame, NormalizationParams)> {
        let params = Self::fit(frame)?;
        let normalized = params.transform(frame)?;
        Ok((normalized, params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn sample_frame() -> Frame {
        Frame::from_rows(
            vec!["open".to_string(), "close".to_string()],
            &[
                vec![1.10, 1.12],
                vec![1.15, 1.14],
                vec![1.13, 1.18],
                vec![1.20, 1.21],
                vec![1.19, 1.17],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_normalized_columns_have_zero_mean_unit_std() {
        let (normalized, _) = Normalizer::fit_transform(&sample_frame()).unwrap();

        for col in normalized.values().columns() {
            let values = col.to_vec();
            let mean = values.iter().sum::<f64>() / values.len() as f64;
            assert_abs_diff_eq!(mean, 0.0, epsilon = 1e-10);
            assert_abs_diff_eq!(sample_std(&values, mean), 1.0, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_inverse_transform_recovers_original() {
        let frame = sample_frame();
        let (normalized, params) = Normalizer::fit_transform(&frame).unwrap();
        let restored = params.inverse_transform(&normalized).unwrap();

        for (a, b) in frame.values().iter().zip(restored.values().iter()) {
            assert_abs_diff_eq!(a, b, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_value_round_trip() {
        let params = Normalizer::fit(&sample_frame()).unwrap();
        let z = params.normalize_value("close", 1.16).unwrap();
        assert_abs_diff_eq!(params.denormalize_value("close", z).unwrap(), 1.16, epsilon = 1e-12);
    }

    #[test]
    fn test_constant_column_fails() {
        let frame = Frame::from_rows(
            vec!["x".to_string(), "flat".to_string()],
            &[vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]],
        )
        .unwrap();

        match Normalizer::fit(&frame) {
            Err(PipelineError::ConstantColumn { column }) => assert_eq!(column, "flat"),
            other => panic!("expected ConstantColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_column_lookup() {
        let params = Normalizer::fit(&sample_frame()).unwrap();
        assert!(params.normalize_value("volume", 1.0).is_err());
    }
}
