//! Regression metrics and held-out evaluation
//!
//! Scores a fitted model on the test set only, in the original units of
//! the target.

use crate::data::{Frame, NormalizationParams};
use crate::error::{PipelineError, Result};
use crate::models::OlsModel;
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::info;

/// Collection of regression metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Squared Error
    pub mse: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared (coefficient of determination)
    pub r2: f64,
    /// Mean Absolute Percentage Error
    pub mape: Option<f64>,
    /// Information Coefficient (correlation)
    pub ic: f64,
    /// Number of samples
    pub n_samples: usize,
}

impl RegressionMetrics {
    /// Calculate all regression metrics
    pub fn calculate(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Self {
        let mse = Self::mean_squared_error(y_true, y_pred);

        Self {
            mse,
            rmse: mse.sqrt(),
            mae: Self::mean_absolute_error(y_true, y_pred),
            r2: Self::r_squared(y_true, y_pred),
            mape: Self::mean_absolute_percentage_error(y_true, y_pred),
            ic: Self::information_coefficient(y_true, y_pred),
            n_samples: y_true.len(),
        }
    }

    /// Mean Squared Error: (1/n) * Σ(y_true - y_pred)²
    pub fn mean_squared_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let n = y_true.len() as f64;
        y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&t, &p)| (t - p).powi(2))
            .sum::<f64>()
            / n
    }

    /// Mean Absolute Error: (1/n) * Σ|y_true - y_pred|
    pub fn mean_absolute_error(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let n = y_true.len() as f64;
        y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&t, &p)| (t - p).abs())
            .sum::<f64>()
            / n
    }

    /// R² = 1 - SS_res / SS_tot, or 0 when the actuals are constant
    pub fn r_squared(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let y_mean = y_true.mean().unwrap_or(0.0);

        let ss_res: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&t, &p)| (t - p).powi(2))
            .sum();

        let ss_tot: f64 = y_true.iter().map(|&t| (t - y_mean).powi(2)).sum();

        // Constant up to rounding relative to the series' magnitude
        let n = y_true.len() as f64;
        if ss_tot <= f64::EPSILON * n * y_mean * y_mean {
            return 0.0;
        }

        1.0 - ss_res / ss_tot
    }

    /// MAPE = (100/n) * Σ|y_true - y_pred| / |y_true|, skipping zero actuals
    pub fn mean_absolute_percentage_error(
        y_true: &Array1<f64>,
        y_pred: &Array1<f64>,
    ) -> Option<f64> {
        let valid_pairs: Vec<(f64, f64)> = y_true
            .iter()
            .zip(y_pred.iter())
            .filter(|(&t, _)| t.abs() > 1e-10)
            .map(|(&t, &p)| (t, p))
            .collect();

        if valid_pairs.is_empty() {
            return None;
        }

        let mape = valid_pairs
            .iter()
            .map(|(t, p)| ((t - p) / t).abs())
            .sum::<f64>()
            / valid_pairs.len() as f64
            * 100.0;

        Some(mape)
    }

    /// Pearson correlation between predictions and actuals
    pub fn information_coefficient(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> f64 {
        let n = y_true.len() as f64;

        let mean_true = y_true.mean().unwrap_or(0.0);
        let mean_pred = y_pred.mean().unwrap_or(0.0);

        let std_true = y_true.std(0.0);
        let std_pred = y_pred.std(0.0);

        if std_true < 1e-10 || std_pred < 1e-10 {
            return 0.0;
        }

        let cov: f64 = y_true
            .iter()
            .zip(y_pred.iter())
            .map(|(&t, &p)| (t - mean_true) * (p - mean_pred))
            .sum::<f64>()
            / n;

        cov / (std_true * std_pred)
    }

    /// Print a summary report
    pub fn report(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Samples:     {}\n\n", self.n_samples));
        s.push_str("Error Metrics:\n");
        s.push_str(&format!("  MSE:       {:.6}\n", self.mse));
        s.push_str(&format!("  RMSE:      {:.6}\n", self.rmse));
        s.push_str(&format!("  MAE:       {:.6}\n", self.mae));
        if let Some(mape) = self.mape {
            s.push_str(&format!("  MAPE:      {:.2}%\n", mape));
        }
        s.push_str("\nGoodness of Fit:\n");
        s.push_str(&format!("  R²:        {:.6}\n", self.r2));
        s.push_str("\nPredictive Power:\n");
        s.push_str(&format!("  IC:        {:.6}\n", self.ic));
        s
    }
}

/// Actual, predicted and residual value for one test row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRow {
    pub actual: f64,
    pub predicted: f64,
    pub residual: f64,
}

/// Metrics and per-row predictions on the held-out set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub metrics: RegressionMetrics,
    pub rows: Vec<PredictionRow>,
}

/// Scores a model on the test set
pub struct Evaluator;

impl Evaluator {
    /// Predict the normalized test frame and score in original target units
    pub fn evaluate(
        model: &OlsModel,
        test: &Frame,
        params: &NormalizationParams,
    ) -> Result<EvaluationResult> {
        if test.n_rows() == 0 {
            return Err(PipelineError::insufficient_data("test set is empty"));
        }

        let target_scale = params.get(&model.target)?;
        let predicted = model
            .predict_frame(test)?
            .mapv(|v| target_scale.denormalize(v));
        let actual = test
            .column_vec(&model.target)?
            .mapv(|v| target_scale.denormalize(v));

        let metrics = RegressionMetrics::calculate(&actual, &predicted);
        let rows = actual
            .iter()
            .zip(predicted.iter())
            .map(|(&actual, &predicted)| PredictionRow {
                actual,
                predicted,
                residual: actual - predicted,
            })
            .collect();

        info!(
            "Test set ({} rows): R²={:.4}, RMSE={:.6}, MAE={:.6}",
            metrics.n_samples, metrics.r2, metrics.rmse, metrics.mae
        );

        Ok(EvaluationResult { metrics, rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Normalizer;
    use crate::models::LinearRegression;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_mse() {
        let y_true = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let y_pred = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let mse = RegressionMetrics::mean_squared_error(&y_true, &y_pred);
        assert!((mse - 0.0).abs() < 1e-10);
    }

    #[test]
    fn test_r_squared_perfect() {
        let y_true = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let y_pred = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let r2 = RegressionMetrics::r_squared(&y_true, &y_pred);
        assert!((r2 - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_r_squared_low_variance_series() {
        // Spread of 1e-6 around a small rate
        let y_true = array![1.0e-4, 1.01e-4, 1.02e-4, 1.03e-4];
        let y_pred = array![1.001e-4, 1.009e-4, 1.021e-4, 1.029e-4];
        let r2 = RegressionMetrics::r_squared(&y_true, &y_pred);
        assert!(r2 > 0.9 && r2 < 1.0, "r2 = {}", r2);

        let constant = array![1.1, 1.1, 1.1, 1.1];
        let pred = array![1.0, 1.2, 1.1, 1.1];
        assert_eq!(RegressionMetrics::r_squared(&constant, &pred), 0.0);
        assert_eq!(RegressionMetrics::r_squared(&array![0.0, 0.0], &array![0.1, 0.0]), 0.0);
    }

    #[test]
    fn test_rmse_dominates_mae() {
        let y_true = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let y_pred = Array1::from_vec(vec![1.5, 1.0, 3.0, 6.0, 4.9]);

        let metrics = RegressionMetrics::calculate(&y_true, &y_pred);
        assert!(metrics.rmse >= metrics.mae);
        assert_abs_diff_eq!(metrics.mae, (0.5 + 1.0 + 0.0 + 2.0 + 0.1) / 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_information_coefficient() {
        let y_true = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        let y_pred = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0]);

        let ic = RegressionMetrics::information_coefficient(&y_true, &y_pred);
        assert!((ic - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_evaluate_reports_original_units() {
        let rows: Vec<Vec<f64>> = (0..30)
            .map(|i| {
                let x = i as f64;
                let noise = if i % 2 == 0 { 0.3 } else { -0.3 };
                vec![x, 100.0 + 2.0 * x + noise]
            })
            .collect();
        let frame = Frame::from_rows(vec!["x".to_string(), "close".to_string()], &rows).unwrap();
        let (normalized, params) = Normalizer::fit_transform(&frame).unwrap();

        let train = normalized.take_rows(&(0..20).collect::<Vec<_>>());
        let test = normalized.take_rows(&(20..30).collect::<Vec<_>>());
        let model = LinearRegression::new("close", vec!["x".to_string()])
            .fit_frame(&train)
            .unwrap();

        let result = Evaluator::evaluate(&model, &test, &params).unwrap();

        assert_eq!(result.rows.len(), 10);
        assert_abs_diff_eq!(result.rows[0].actual, rows[20][1], epsilon = 1e-9);
        for row in &result.rows {
            assert_abs_diff_eq!(row.residual, row.actual - row.predicted, epsilon = 1e-12);
        }
        assert!(result.metrics.rmse >= result.metrics.mae);
        assert!(result.metrics.mae < 0.5);
        assert!(result.metrics.r2 > 0.99);
    }
}
