//! Residual diagnostics for fitted regressions
//!
//! Both tests are informational: a test that cannot be computed yields
//! `None` and the caller carries on.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};
use tracing::warn;

/// Statistic and p-value of a hypothesis test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
}

/// Outcome of the residual diagnostics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualDiagnostics {
    /// Shapiro-Wilk normality test of the residuals
    pub normality: Option<TestResult>,
    /// Non-constant variance score test against fitted values
    pub heteroscedasticity: Option<TestResult>,
}

impl ResidualDiagnostics {
    /// Run both tests, recording failures as `None`
    pub fn compute(residuals: &[f64], fitted: &[f64]) -> Self {
        let normality = shapiro_wilk(residuals);
        if normality.is_none() {
            warn!(
                "Shapiro-Wilk test not available for {} residuals",
                residuals.len()
            );
        }

        let heteroscedasticity = ncv_test(residuals, fitted);
        if heteroscedasticity.is_none() {
            warn!("Non-constant variance test not available");
        }

        Self {
            normality,
            heteroscedasticity,
        }
    }
}

// Royston (1995) polynomial coefficients
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Evaluate c[0] + c[1] x + c[2] x^2 + ...
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &coef| acc * x + coef)
}

/// Shapiro-Wilk W statistic with Royston's p-value approximation.
///
/// Defined for 3 <= n <= 5000 and non-degenerate data.
pub fn shapiro_wilk(data: &[f64]) -> Option<TestResult> {
    let n = data.len();
    if !(3..=5000).contains(&n) || data.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let mut x = data.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));
    let range = x[n - 1] - x[0];
    if range < 1e-19 {
        return None;
    }

    let std_normal = Normal::new(0.0, 1.0).ok()?;
    let an = n as f64;
    let half = n / 2;

    // Coefficients for the lower half, stored as positive weights
    let mut a = vec![0.0; half];
    if n == 3 {
        a[0] = std::f64::consts::FRAC_1_SQRT_2;
    } else {
        let m: Vec<f64> = (1..=half)
            .map(|i| std_normal.inverse_cdf((i as f64 - 0.375) / (an + 0.25)))
            .collect();
        let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
        let ssumm2 = summ2.sqrt();
        let rsn = 1.0 / an.sqrt();
        let a1 = poly(&C1, rsn) - m[0] / ssumm2;

        let (start, fac) = if n > 5 {
            let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
            let fac = ((summ2 - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1])
                / (1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2))
                .sqrt();
            a[1] = a2;
            (2, fac)
        } else {
            let fac = ((summ2 - 2.0 * m[0] * m[0]) / (1.0 - 2.0 * a1 * a1)).sqrt();
            (1, fac)
        };
        a[0] = a1;
        for i in start..half {
            a[i] = -m[i] / fac;
        }
    }

    // Antisymmetric weights over the full sorted sample
    let mut weights = vec![0.0; n];
    for (i, &ai) in a.iter().enumerate() {
        weights[i] = -ai;
        weights[n - 1 - i] = ai;
    }

    let scaled: Vec<f64> = x.iter().map(|v| v / range).collect();
    let w_mean = weights.iter().sum::<f64>() / an;
    let x_mean = scaled.iter().sum::<f64>() / an;

    let (mut ssa, mut ssx, mut sax) = (0.0, 0.0, 0.0);
    for (wi, xi) in weights.iter().zip(&scaled) {
        let da = wi - w_mean;
        let dx = xi - x_mean;
        ssa += da * da;
        ssx += dx * dx;
        sax += da * dx;
    }

    let ssassx = (ssa * ssx).sqrt();
    let w1 = ((ssassx - sax) * (ssassx + sax) / (ssa * ssx)).max(0.0);
    let w = 1.0 - w1;

    let p_value = if n == 3 {
        let pi6 = 6.0 / std::f64::consts::PI;
        let stqr = std::f64::consts::PI / 3.0;
        (pi6 * (w.sqrt().asin() - stqr)).max(0.0)
    } else {
        let mut y = w1.ln();
        let (mean, sd) = if n <= 11 {
            let gamma = poly(&G, an);
            if y >= gamma {
                return Some(TestResult {
                    statistic: w,
                    p_value: 1e-99,
                });
            }
            y = -(gamma - y).ln();
            (poly(&C3, an), poly(&C4, an).exp())
        } else {
            let ln_n = an.ln();
            (poly(&C5, ln_n), poly(&C6, ln_n).exp())
        };
        1.0 - Normal::new(mean, sd).ok()?.cdf(y)
    };

    if !w.is_finite() || !p_value.is_finite() {
        return None;
    }

    Some(TestResult {
        statistic: w,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

/// Score test for non-constant error variance against the fitted
/// values (Cook-Weisberg).
///
/// Regresses `e^2 / (RSS / n)` on `[1, fitted]`; the statistic is half
/// the regression sum of squares and is chi-squared with 1 degree of
/// freedom under homoscedasticity.
pub fn ncv_test(residuals: &[f64], fitted: &[f64]) -> Option<TestResult> {
    let n = residuals.len();
    if n < 3 || fitted.len() != n {
        return None;
    }

    let rss: f64 = residuals.iter().map(|e| e * e).sum();
    if rss <= 0.0 || !rss.is_finite() {
        return None;
    }
    let sigma2 = rss / n as f64;
    let u: Vec<f64> = residuals.iter().map(|e| e * e / sigma2).collect();

    let nf = n as f64;
    let f_mean = fitted.iter().sum::<f64>() / nf;
    let u_mean = u.iter().sum::<f64>() / nf;

    let sxx: f64 = fitted.iter().map(|f| (f - f_mean).powi(2)).sum();
    if sxx <= f64::EPSILON * nf {
        return None;
    }
    let sxy: f64 = fitted
        .iter()
        .zip(&u)
        .map(|(f, ui)| (f - f_mean) * (ui - u_mean))
        .sum();

    // Regression sum of squares of a simple linear fit
    let ss_reg = sxy * sxy / sxx;
    let statistic = ss_reg / 2.0;

    let chi2 = ChiSquared::new(1.0).ok()?;
    let p_value = 1.0 - chi2.cdf(statistic);
    if !statistic.is_finite() || !p_value.is_finite() {
        return None;
    }

    Some(TestResult {
        statistic,
        p_value: p_value.clamp(0.0, 1.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Exp, Normal as NormalDist};

    #[test]
    fn test_poly() {
        assert_abs_diff_eq!(poly(&[1.0, 2.0, 3.0], 2.0), 17.0);
    }

    #[test]
    fn test_shapiro_wilk_three_points() {
        // Equally spaced points are perfectly "normal" for n = 3
        let result = shapiro_wilk(&[1.0, 2.0, 3.0]).unwrap();
        assert_abs_diff_eq!(result.statistic, 1.0, epsilon = 1e-10);
        assert_abs_diff_eq!(result.p_value, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_shapiro_wilk_normal_sample_is_not_rejected() {
        let mut rng = StdRng::seed_from_u64(7);
        let dist = NormalDist::new(0.0, 1.0).unwrap();
        let sample: Vec<f64> = (0..200).map(|_| dist.sample(&mut rng)).collect();

        let result = shapiro_wilk(&sample).unwrap();
        assert!(result.statistic > 0.97);
        assert!(result.statistic <= 1.0);
        assert!(result.p_value > 0.001);
    }

    #[test]
    fn test_shapiro_wilk_skewed_sample_is_rejected() {
        let mut rng = StdRng::seed_from_u64(11);
        let dist = Exp::new(1.0).unwrap();
        let sample: Vec<f64> = (0..200).map(|_| { let x: f64 = dist.sample(&mut rng); x.powi(3) }).collect();

        let result = shapiro_wilk(&sample).unwrap();
        assert!(result.p_value < 0.001);
    }

    #[test]
    fn test_shapiro_wilk_degenerate_inputs() {
        assert!(shapiro_wilk(&[1.0, 2.0]).is_none());
        assert!(shapiro_wilk(&[4.0; 10]).is_none());
    }

    #[test]
    fn test_ncv_detects_fanning_residuals() {
        let mut rng = StdRng::seed_from_u64(3);
        let dist = NormalDist::new(0.0, 1.0).unwrap();
        let fitted: Vec<f64> = (0..300).map(|i| i as f64 / 30.0).collect();
        let residuals: Vec<f64> = fitted
            .iter()
            .map(|f| dist.sample(&mut rng) * (0.1 + f))
            .collect();

        let result = ncv_test(&residuals, &fitted).unwrap();
        assert!(result.statistic > 10.0);
        assert!(result.p_value < 0.01);
    }

    #[test]
    fn test_ncv_unavailable_for_constant_fit() {
        assert!(ncv_test(&[0.1, -0.2, 0.1, 0.3], &[1.0; 4]).is_none());
        assert!(ncv_test(&[0.0; 4], &[1.0, 2.0, 3.0, 4.0]).is_none());
    }

    #[test]
    fn test_compute_records_missing_results() {
        let diagnostics = ResidualDiagnostics::compute(&[0.0, 0.0], &[1.0, 2.0]);
        assert!(diagnostics.normality.is_none());
        assert!(diagnostics.heteroscedasticity.is_none());
    }
}
