//! Descriptive statistics per column

use super::table::Frame;
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Summary statistics for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation (N-1); NaN for fewer than 2 values
    pub std_dev: f64,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub missing: usize,
}

impl ColumnSummary {
    /// Summarize a column of complete values
    pub fn from_values(column: &str, values: ArrayView1<'_, f64>) -> Self {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let count = sorted.len();
        let mean = if count > 0 {
            sorted.iter().sum::<f64>() / count as f64
        } else {
            f64::NAN
        };

        Self {
            column: column.to_string(),
            count,
            mean,
            std_dev: sample_std(&sorted, mean),
            min: sorted.first().copied().unwrap_or(f64::NAN),
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied().unwrap_or(f64::NAN),
            missing: 0,
        }
    }
}

/// Per-column summaries in frame column order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptiveStats {
    pub columns: Vec<ColumnSummary>,
}

impl DescriptiveStats {
    /// Compute statistics for every column of a cleaned frame
    pub fn compute(frame: &Frame) -> Self {
        let columns = frame
            .columns()
            .iter()
            .zip(frame.values().columns())
            .map(|(name, values)| ColumnSummary::from_values(name, values))
            .collect();

        Self { columns }
    }

    /// Look up the summary for a column
    pub fn get(&self, column: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.column == column)
    }

    /// Fixed-width text table
    pub fn to_table_string(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!(
            "{:<16} {:>6} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>7}\n",
            "Column", "N", "Mean", "Std", "Min", "Q1", "Median", "Q3", "Max", "Missing"
        ));
        s.push_str(&format!("{}\n", "-".repeat(124)));
        for c in &self.columns {
            s.push_str(&format!(
                "{:<16} {:>6} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>12.4} {:>7}\n",
                c.column, c.count, c.mean, c.std_dev, c.min, c.q1, c.median, c.q3, c.max, c.missing
            ));
        }
        s
    }
}

/// Sample standard deviation with N-1 denominator
pub fn sample_std(values: &[f64], mean: f64) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// Quantile of sorted data by linear interpolation between order
/// statistics, at position h = (n - 1) * p
pub fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let h = (n - 1) as f64 * p.clamp(0.0, 1.0);
            let lo = h.floor() as usize;
            let hi = h.ceil() as usize;
            sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_column_summary() {
        let frame = Frame::from_rows(
            vec!["x".to_string()],
            &[vec![4.0], vec![1.0], vec![3.0], vec![2.0], vec![5.0]],
        )
        .unwrap();

        let stats = DescriptiveStats::compute(&frame);
        let x = stats.get("x").unwrap();

        assert_eq!(x.count, 5);
        assert_abs_diff_eq!(x.mean, 3.0);
        assert_abs_diff_eq!(x.std_dev, 2.5f64.sqrt(), epsilon = 1e-12);
        assert_abs_diff_eq!(x.min, 1.0);
        assert_abs_diff_eq!(x.q1, 2.0);
        assert_abs_diff_eq!(x.median, 3.0);
        assert_abs_diff_eq!(x.q3, 4.0);
        assert_abs_diff_eq!(x.max, 5.0);
        assert_eq!(x.missing, 0);
    }

    #[test]
    fn test_quantile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.25), 1.75);
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.5), 2.5);
        assert_abs_diff_eq!(quantile_sorted(&sorted, 0.75), 3.25);
    }

    #[test]
    fn test_single_value_has_nan_std() {
        assert!(sample_std(&[1.0], 1.0).is_nan());
        assert_abs_diff_eq!(quantile_sorted(&[7.0], 0.9), 7.0);
    }
}
