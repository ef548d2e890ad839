//! In-memory run report
//!
//! Assembled once the computation is finished and rendered to text
//! without touching the filesystem.

use crate::data::{CleaningSummary, DescriptiveStats};
use crate::metrics::RegressionMetrics;
use crate::models::{Coefficient, OlsModel, ResidualDiagnostics, TestResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// In-sample fit statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitStatistics {
    pub n_obs: usize,
    pub residual_std_error: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub df_model: usize,
    pub df_residual: usize,
}

impl From<&OlsModel> for FitStatistics {
    fn from(model: &OlsModel) -> Self {
        Self {
            n_obs: model.n_obs,
            residual_std_error: model.residual_std_error,
            r_squared: model.r_squared,
            adj_r_squared: model.adj_r_squared,
            f_statistic: model.f_statistic,
            f_p_value: model.f_p_value,
            df_model: model.df_model,
            df_residual: model.df_residual,
        }
    }
}

/// Split sizes and settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitSummary {
    pub train_rows: usize,
    pub test_rows: usize,
    pub train_fraction: f64,
    pub seed: u64,
}

/// Snapshot of a pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub input: PathBuf,
    pub target: String,
    pub features: Vec<String>,
    pub skipped_columns: Vec<String>,
    pub cleaning: CleaningSummary,
    pub stats: DescriptiveStats,
    pub split: SplitSummary,
    pub coefficients: Vec<Coefficient>,
    pub fit: FitStatistics,
    pub metrics: RegressionMetrics,
    pub diagnostics: ResidualDiagnostics,
}

impl Report {
    /// Render the report as plain text
    pub fn render(&self) -> String {
        let rule = "=".repeat(60);
        let mut s = String::new();

        s.push_str("Closing Price Regression Report\n");
        s.push_str(&format!("{}\n", rule));
        s.push_str(&format!(
            "Generated: {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        ));
        s.push_str(&format!("Input:     {}\n", self.input.display()));
        s.push_str(&format!("Target:    {}\n", self.target));
        s.push_str(&format!("Features:  {}\n", self.features.join(", ")));
        if !self.skipped_columns.is_empty() {
            s.push_str(&format!(
                "Skipped non-numeric columns: {}\n",
                self.skipped_columns.join(", ")
            ));
        }

        s.push_str(&format!("\nData Cleaning\n{}\n", "-".repeat(13)));
        s.push_str(&format!("Original rows:        {}\n", self.cleaning.original_rows));
        s.push_str(&format!("Removed (missing):    {}\n", self.cleaning.removed_missing));
        s.push_str(&format!("Removed (duplicates): {}\n", self.cleaning.removed_duplicates));
        s.push_str(&format!(
            "Final rows:           {} ({:.1}% retained)\n",
            self.cleaning.final_rows,
            self.cleaning.retained_ratio() * 100.0
        ));
        if let Some(warning) = &self.cleaning.warning {
            s.push_str(&format!("WARNING: {}\n", warning));
        }

        s.push_str(&format!("\nDescriptive Statistics\n{}\n", "-".repeat(22)));
        s.push_str(&self.stats.to_table_string());

        s.push_str(&format!("\nTrain/Test Split\n{}\n", "-".repeat(16)));
        s.push_str(&format!(
            "Train rows: {}, Test rows: {} (p = {}, seed = {})\n",
            self.split.train_rows, self.split.test_rows, self.split.train_fraction, self.split.seed
        ));

        s.push_str(&format!("\nCoefficients (standardized scale)\n{}\n", "-".repeat(33)));
        s.push_str(&format!(
            "{:<20} {:>12} {:>12} {:>10} {:>12}\n",
            "Term", "Estimate", "Std. Error", "t value", "Pr(>|t|)"
        ));
        for c in &self.coefficients {
            s.push_str(&format!(
                "{:<20} {:>12.6} {:>12.6} {:>10.3} {:>12.4e}\n",
                c.term, c.estimate, c.std_error, c.t_value, c.p_value
            ));
        }

        s.push_str(&format!("\nModel Fit (training set)\n{}\n", "-".repeat(24)));
        s.push_str(&format!("Observations:            {}\n", self.fit.n_obs));
        s.push_str(&format!(
            "Residual standard error: {:.6} on {} DF\n",
            self.fit.residual_std_error, self.fit.df_residual
        ));
        s.push_str(&format!("R²:                      {:.6}\n", self.fit.r_squared));
        s.push_str(&format!("Adjusted R²:             {:.6}\n", self.fit.adj_r_squared));
        s.push_str(&format!(
            "F-statistic:             {:.4} on {} and {} DF, p-value {:.4e}\n",
            self.fit.f_statistic, self.fit.df_model, self.fit.df_residual, self.fit.f_p_value
        ));

        s.push_str(&format!("\nResidual Diagnostics\n{}\n", "-".repeat(20)));
        s.push_str(&format_test("Shapiro-Wilk normality", "W", self.diagnostics.normality));
        s.push_str(&format_test(
            "Non-constant variance",
            "Chi²",
            self.diagnostics.heteroscedasticity,
        ));

        s.push_str(&format!("\nTest Set Evaluation (original units)\n{}\n", "-".repeat(36)));
        s.push_str(&self.metrics.report());

        s
    }
}

fn format_test(name: &str, statistic: &str, result: Option<TestResult>) -> String {
    match result {
        Some(r) => format!(
            "{:<24} {} = {:.6}, p-value = {:.4e}\n",
            name, statistic, r.statistic, r.p_value
        ),
        None => format!("{:<24} not available\n", name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{ColumnSummary, QualityWarning};
    use chrono::TimeZone;

    fn report(normality: Option<TestResult>) -> Report {
        Report {
            generated_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
            input: PathBuf::from("eurusd.csv"),
            target: "Close".to_string(),
            features: vec!["Open".to_string()],
            skipped_columns: vec!["Date".to_string()],
            cleaning: CleaningSummary {
                original_rows: 10,
                removed_missing: 4,
                removed_duplicates: 0,
                final_rows: 6,
                warning: Some(QualityWarning::ExcessiveDataLoss {
                    retained_ratio: 0.6,
                    threshold: 0.7,
                }),
            },
            stats: DescriptiveStats {
                columns: vec![ColumnSummary {
                    column: "Open".to_string(),
                    count: 6,
                    mean: 1.1,
                    std_dev: 0.1,
                    min: 1.0,
                    q1: 1.05,
                    median: 1.1,
                    q3: 1.15,
                    max: 1.2,
                    missing: 0,
                }],
            },
            split: SplitSummary {
                train_rows: 5,
                test_rows: 1,
                train_fraction: 0.8,
                seed: 123,
            },
            coefficients: vec![Coefficient {
                term: "(Intercept)".to_string(),
                estimate: 0.0,
                std_error: 0.1,
                t_value: 0.0,
                p_value: 1.0,
            }],
            fit: FitStatistics {
                n_obs: 5,
                residual_std_error: 0.2,
                r_squared: 0.9,
                adj_r_squared: 0.87,
                f_statistic: 27.0,
                f_p_value: 0.01,
                df_model: 1,
                df_residual: 3,
            },
            metrics: RegressionMetrics {
                mse: 0.01,
                rmse: 0.1,
                mae: 0.1,
                r2: 0.0,
                mape: None,
                ic: 0.0,
                n_samples: 1,
            },
            diagnostics: ResidualDiagnostics {
                normality,
                heteroscedasticity: Some(TestResult {
                    statistic: 0.5,
                    p_value: 0.48,
                }),
            },
        }
    }

    #[test]
    fn test_render_contains_all_sections() {
        let text = report(Some(TestResult {
            statistic: 0.97,
            p_value: 0.4,
        }))
        .render();

        assert!(text.contains("Generated: 2024-03-01 12:00:00 UTC"));
        assert!(text.contains("WARNING: excessive data loss"));
        assert!(text.contains("Descriptive Statistics"));
        assert!(text.contains("(Intercept)"));
        assert!(text.contains("Shapiro-Wilk normality"));
        assert!(text.contains("RMSE:"));
        assert!(text.contains("Skipped non-numeric columns: Date"));
    }

    #[test]
    fn test_unavailable_diagnostic_is_reported() {
        let text = report(None).render();
        assert!(text.contains("Shapiro-Wilk normality   not available"));
    }
}
