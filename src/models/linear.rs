//! Ordinary least squares regression
//!
//! Fits `target ~ 1 + features` with a Householder QR factorization of
//! the design matrix. The normal equations are never formed, and a
//! design matrix without full column rank is rejected instead of
//! producing unstable coefficients.

use super::diagnostics::ResidualDiagnostics;
use crate::data::Frame;
use crate::error::{PipelineError, Result};
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, FisherSnedecor, StudentsT};
use tracing::{debug, info};

/// Name of the intercept term in coefficient tables
pub const INTERCEPT: &str = "(Intercept)";

/// Relative tolerance for the rank check
pub const RANK_TOLERANCE: f64 = 1e-7;

/// One row of the coefficient table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coefficient {
    pub term: String,
    pub estimate: f64,
    pub std_error: f64,
    pub t_value: f64,
    pub p_value: f64,
}

/// Fitted OLS model
#[derive(Debug, Clone)]
pub struct OlsModel {
    /// Target column name
    pub target: String,
    /// Feature names in design-matrix order (intercept excluded)
    pub features: Vec<String>,
    /// Intercept first, then one row per feature
    pub coefficients: Vec<Coefficient>,
    pub residuals: Array1<f64>,
    pub fitted_values: Array1<f64>,
    pub residual_std_error: f64,
    pub r_squared: f64,
    pub adj_r_squared: f64,
    pub f_statistic: f64,
    pub f_p_value: f64,
    pub df_model: usize,
    pub df_residual: usize,
    pub n_obs: usize,
    pub diagnostics: ResidualDiagnostics,
}

impl OlsModel {
    pub fn intercept(&self) -> f64 {
        self.coefficients[0].estimate
    }

    /// Feature slopes in `features` order
    pub fn slopes(&self) -> Array1<f64> {
        self.coefficients[1..].iter().map(|c| c.estimate).collect()
    }

    /// Estimate for a term, including `(Intercept)`
    pub fn coefficient(&self, term: &str) -> Option<f64> {
        self.coefficients
            .iter()
            .find(|c| c.term == term)
            .map(|c| c.estimate)
    }

    /// Predict for a feature matrix whose columns follow `features`
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if x.ncols() != self.features.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.features.len(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(&self.slopes()) + self.intercept())
    }

    /// Predict for the feature columns of a frame
    pub fn predict_frame(&self, frame: &Frame) -> Result<Array1<f64>> {
        self.predict(&frame.select(&self.features)?)
    }

    /// Text summary of the fit
    pub fn summary(&self) -> String {
        let mut s = String::new();
        s.push_str("Linear Regression Summary\n");
        s.push_str("=========================\n\n");
        s.push_str(&format!(
            "Formula: {} ~ 1 + {}\n\n",
            self.target,
            self.features.join(" + ")
        ));
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
        s.push_str(&format!(
            "\nResidual standard error: {:.6} on {} degrees of freedom\n",
            self.residual_std_error, self.df_residual
        ));
        s.push_str(&format!(
            "Multiple R-squared: {:.6}, Adjusted R-squared: {:.6}\n",
            self.r_squared, self.adj_r_squared
        ));
        s.push_str(&format!(
            "F-statistic: {:.4} on {} and {} DF, p-value: {:.4e}\n",
            self.f_statistic, self.df_model, self.df_residual, self.f_p_value
        ));
        s
    }
}

/// OLS fitter for a fixed target and feature list
#[derive(Debug, Clone)]
pub struct LinearRegression {
    target: String,
    features: Vec<String>,
}

impl LinearRegression {
    /// Create a fitter for `target ~ 1 + features`
    pub fn new(target: impl Into<String>, features: Vec<String>) -> Self {
        Self {
            target: target.into(),
            features,
        }
    }

    /// Fit on the target and feature columns of a frame
    pub fn fit_frame(&self, frame: &Frame) -> Result<OlsModel> {
        let x = frame.select(&self.features)?;
        let y = frame.column_vec(&self.target)?;
        self.fit(&x, &y)
    }

    /// Fit on a feature matrix (columns in `features` order) and target
    pub fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<OlsModel> {
        if x.nrows() != y.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: x.nrows(),
                got: y.len(),
            });
        }
        if x.ncols() != self.features.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: self.features.len(),
                got: x.ncols(),
            });
        }

        let n = x.nrows();
        let p = x.ncols() + 1;
        if n <= p {
            return Err(PipelineError::insufficient_data(format!(
                "{} observations cannot fit {} terms with residual degrees of freedom left",
                n, p
            )));
        }

        let ones = Array2::<f64>::ones((n, 1));
        let design = ndarray::concatenate(Axis(1), &[ones.view(), x.view()])
            .map_err(|e| PipelineError::invalid_config(e.to_string()))?;

        let terms: Vec<String> = std::iter::once(INTERCEPT.to_string())
            .chain(self.features.iter().cloned())
            .collect();

        let qr = HouseholderQr::factorize(design.clone(), y.clone());
        qr.check_rank(&design, &terms, RANK_TOLERANCE)?;
        let beta = qr.solve();

        let fitted_values = design.dot(&beta);
        let residuals = y - &fitted_values;

        let df_residual = n - p;
        let df_model = p - 1;
        let rss: f64 = residuals.iter().map(|e| e * e).sum();
        let y_mean = y.mean().unwrap_or(0.0);
        let tss: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();

        let sigma2 = rss / df_residual as f64;
        let r_squared = if tss > 0.0 { 1.0 - rss / tss } else { 0.0 };
        let adj_r_squared = 1.0 - (1.0 - r_squared) * (n - 1) as f64 / df_residual as f64;

        let f_statistic = ((tss - rss) / df_model as f64) / sigma2;
        let f_p_value = FisherSnedecor::new(df_model as f64, df_residual as f64)
            .map(|dist| upper_tail(f_statistic, |v| dist.cdf(v)))
            .unwrap_or(f64::NAN);

        let t_dist = StudentsT::new(0.0, 1.0, df_residual as f64).ok();
        let unscaled = qr.unscaled_covariance_diag();

        let coefficients = terms
            .into_iter()
            .zip(beta.iter())
            .zip(unscaled.iter())
            .map(|((term, &estimate), &var)| {
                let std_error = (sigma2 * var).sqrt();
                let t_value = estimate / std_error;
                let p_value = match &t_dist {
                    Some(dist) => 2.0 * upper_tail(t_value.abs(), |v| dist.cdf(v)),
                    None => f64::NAN,
                };
                Coefficient {
                    term,
                    estimate,
                    std_error,
                    t_value,
                    p_value,
                }
            })
            .collect::<Vec<_>>();

        for c in &coefficients {
            debug!("{:<20} {:>12.6} (se {:.6})", c.term, c.estimate, c.std_error);
        }

        let diagnostics =
            ResidualDiagnostics::compute(&residuals.to_vec(), &fitted_values.to_vec());

        info!(
            "Fitted OLS on {} rows: R²={:.4}, adj R²={:.4}, F={:.3}",
            n, r_squared, adj_r_squared, f_statistic
        );

        Ok(OlsModel {
            target: self.target.clone(),
            features: self.features.clone(),
            coefficients,
            residuals,
            fitted_values,
            residual_std_error: sigma2.sqrt(),
            r_squared,
            adj_r_squared,
            f_statistic,
            f_p_value,
            df_model,
            df_residual,
            n_obs: n,
            diagnostics,
        })
    }
}

/// 1 - cdf(x), with the infinite and NaN cases pinned down
fn upper_tail(x: f64, cdf: impl Fn(f64) -> f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x == f64::INFINITY {
        0.0
    } else {
        (1.0 - cdf(x)).clamp(0.0, 1.0)
    }
}

/// Householder QR of a tall design matrix, carrying Q'y along
struct HouseholderQr {
    /// Upper triangle holds R
    r: Array2<f64>,
    /// Q'y
    qty: Array1<f64>,
}

impl HouseholderQr {
    fn factorize(mut a: Array2<f64>, mut y: Array1<f64>) -> Self {
        let (n, p) = a.dim();

        for k in 0..p.min(n) {
            let norm = a.slice(s![k.., k]).iter().map(|v| v * v).sum::<f64>().sqrt();
            if norm == 0.0 {
                continue;
            }

            let alpha = if a[[k, k]] > 0.0 { -norm } else { norm };
            let mut v = a.slice(s![k.., k]).to_owned();
            v[0] -= alpha;
            let v_norm2: f64 = v.iter().map(|x| x * x).sum();
            if v_norm2 == 0.0 {
                continue;
            }

            // A[k.., j] -= 2 v (v' A[k.., j]) / (v'v)
            for j in k..p {
                let mut col = a.slice_mut(s![k.., j]);
                let scale = 2.0 * v.dot(&col) / v_norm2;
                col.scaled_add(-scale, &v);
            }

            let mut tail = y.slice_mut(s![k..]);
            let scale = 2.0 * v.dot(&tail) / v_norm2;
            tail.scaled_add(-scale, &v);
        }

        Self { r: a, qty: y }
    }

    /// Reject columns whose diagonal of R is negligible relative to the
    /// column's original norm
    fn check_rank(&self, design: &Array2<f64>, terms: &[String], tolerance: f64) -> Result<()> {
        for (j, term) in terms.iter().enumerate() {
            let col_norm = design.column(j).iter().map(|v| v * v).sum::<f64>().sqrt();
            let diag = self.r[[j, j]].abs();
            if col_norm == 0.0 || diag <= tolerance * col_norm {
                return Err(PipelineError::RankDeficiency { term: term.clone() });
            }
        }
        Ok(())
    }

    /// Back substitution of R beta = Q'y
    fn solve(&self) -> Array1<f64> {
        let p = self.r.ncols();
        let mut beta = Array1::<f64>::zeros(p);
        for i in (0..p).rev() {
            let mut sum = self.qty[i];
            for j in (i + 1)..p {
                sum -= self.r[[i, j]] * beta[j];
            }
            beta[i] = sum / self.r[[i, i]];
        }
        beta
    }

    /// Diagonal of (R'R)^-1 = R^-1 R^-T
    fn unscaled_covariance_diag(&self) -> Array1<f64> {
        let p = self.r.ncols();
        let mut r_inv = Array2::<f64>::zeros((p, p));

        for col in 0..p {
            for i in (0..=col).rev() {
                let mut sum = if i == col { 1.0 } else { 0.0 };
                for j in (i + 1)..=col {
                    sum -= self.r[[i, j]] * r_inv[[j, col]];
                }
                r_inv[[i, col]] = sum / self.r[[i, i]];
            }
        }

        r_inv
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|v| v * v).sum())
            .collect()
    }
}
