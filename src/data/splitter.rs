//! Reproducible stratified train/test split
//!
//! Rows are ranked by the target and cut into quantile buckets; each
//! bucket contributes its proportional share of training rows, drawn
//! with an explicitly seeded RNG. Same frame + seed + proportion always
//! yields the same row membership.

use super::table::Frame;
use crate::error::{PipelineError, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::info;

/// Default share of rows used for training
pub const DEFAULT_TRAIN_FRACTION: f64 = 0.8;
/// Default seed
pub const DEFAULT_SEED: u64 = 123;
/// Default number of target quantile buckets
pub const DEFAULT_STRATA: usize = 5;

/// Row membership of a split plus the derived frames
#[derive(Debug, Clone)]
pub struct Split {
    /// Sorted row indices of the training set
    pub train_indices: Vec<usize>,
    /// Sorted row indices of the test set
    pub test_indices: Vec<usize>,
    pub train: Frame,
    pub test: Frame,
}

/// Stratified splitter
#[derive(Debug, Clone)]
pub struct Splitter {
    train_fraction: f64,
    seed: u64,
    strata: usize,
}

impl Default for Splitter {
    fn default() -> Self {
        Self {
            train_fraction: DEFAULT_TRAIN_FRACTION,
            seed: DEFAULT_SEED,
            strata: DEFAULT_STRATA,
        }
    }
}

impl Splitter {
    pub fn new(train_fraction: f64, seed: u64, strata: usize) -> Result<Self> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(PipelineError::invalid_config(format!(
                "train fraction must be in (0, 1), got {}",
                train_fraction
            )));
        }
        if strata == 0 {
            return Err(PipelineError::invalid_config(
                "number of strata must be at least 1",
            ));
        }

        Ok(Self {
            train_fraction,
            seed,
            strata,
        })
    }

    /// Split a frame, stratifying on `target`
    pub fn split(&self, frame: &Frame, target: &str) -> Result<Split> {
        let y = frame.column(target)?;
        let n = y.len();

        let n_train = (self.train_fraction * n as f64).round() as usize;
        if n_train == 0 || n_train >= n {
            return Err(PipelineError::insufficient_data(format!(
                "splitting {} rows at {} leaves an empty {} set",
                n,
                self.train_fraction,
                if n_train == 0 { "training" } else { "test" }
            )));
        }

        let mut ranked: Vec<usize> = (0..n).collect();
        ranked.sort_by(|&a, &b| y[a].total_cmp(&y[b]).then(a.cmp(&b)));

        let buckets = bucket_ranks(&ranked, self.strata.min(n));
        let quotas = allocate(&buckets, n_train, n);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut train_indices = Vec::with_capacity(n_train);
        let mut test_indices = Vec::with_capacity(n - n_train);

        for (bucket, quota) in buckets.into_iter().zip(quotas) {
            let mut members = bucket.to_vec();
            members.shuffle(&mut rng);
            train_indices.extend_from_slice(&members[..quota]);
            test_indices.extend_from_slice(&members[quota..]);
        }

        train_indices.sort_unstable();
        test_indices.sort_unstable();

        info!(
            "Split {} rows into {} train / {} test (seed {})",
            n,
            train_indices.len(),
            test_indices.len(),
            self.seed
        );

        Ok(Split {
            train: frame.take_rows(&train_indices),
            test: frame.take_rows(&test_indices),
            train_indices,
            test_indices,
        })
    }
}

/// Cut ranked rows into `k` contiguous buckets of near-equal size
fn bucket_ranks(ranked: &[usize], k: usize) -> Vec<&[usize]> {
    let n = ranked.len();
    (0..k)
        .map(|b| &ranked[b * n / k..(b + 1) * n / k])
        .collect()
}

/// Largest-remainder allocation of `n_train` across buckets
fn allocate(buckets: &[&[usize]], n_train: usize, n: usize) -> Vec<usize> {
    let exact: Vec<f64> = buckets
        .iter()
        .map(|b| b.len() as f64 * n_train as f64 / n as f64)
        .collect();
    let mut quotas: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();

    let mut remaining = n_train - quotas.iter().sum::<usize>();
    let mut order: Vec<usize> = (0..buckets.len()).collect();
    order.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.total_cmp(&ra).then(a.cmp(&b))
    });

    for idx in order {
        if remaining == 0 {
            break;
        }
        if quotas[idx] < buckets[idx].len() {
            quotas[idx] += 1;
            remaining -= 1;
        }
    }

    quotas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(n: usize) -> Frame {
        let rows: Vec<Vec<f64>> = (0..n)
            .map(|i| vec![i as f64, ((i * 37) % 101) as f64])
            .collect();
        Frame::from_rows(vec!["x".to_string(), "close".to_string()], &rows).unwrap()
    }

    #[test]
    fn test_split_sizes() {
        let split = Splitter::new(0.8, 123, 5).unwrap().split(&frame(1000), "close").unwrap();
        assert_eq!(split.train_indices.len(), 800);
        assert_eq!(split.test_indices.len(), 200);
        assert_eq!(split.train.n_rows(), 800);
        assert_eq!(split.test.n_rows(), 200);
    }

    #[test]
    fn test_split_is_disjoint_and_exhaustive() {
        let split = Splitter::default().split(&frame(57), "close").unwrap();

        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..57).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_deterministic() {
        let data = frame(250);
        let splitter = Splitter::new(0.75, 42, 4).unwrap();
        let a = splitter.split(&data, "close").unwrap();
        let b = splitter.split(&data, "close").unwrap();
        assert_eq!(a.train_indices, b.train_indices);
        assert_eq!(a.test_indices, b.test_indices);

        let c = Splitter::new(0.75, 43, 4).unwrap().split(&data, "close").unwrap();
        assert_ne!(a.train_indices, c.train_indices);
    }

    #[test]
    fn test_split_is_balanced_across_target_buckets() {
        let data = frame(1000);
        let split = Splitter::default().split(&data, "close").unwrap();
        let y = data.column("close").unwrap();

        let mut sorted: Vec<f64> = y.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = sorted[500];

        let test_low = split.test_indices.iter().filter(|&&i| y[i] < median).count();
        let share = test_low as f64 / split.test_indices.len() as f64;
        assert!((share - 0.5).abs() < 0.08, "share below median = {}", share);
    }

    #[test]
    fn test_tiny_input_is_insufficient() {
        let result = Splitter::new(0.8, 1, 5).unwrap().split(&frame(2), "close");
        // round(1.6) = 2 leaves nothing for the test set
        assert!(matches!(result, Err(PipelineError::InsufficientData(_))));
    }

    #[test]
    fn test_invalid_fraction() {
        assert!(Splitter::new(1.0, 1, 5).is_err());
        assert!(Splitter::new(0.0, 1, 5).is_err());
    }

    #[test]
    fn test_allocate_is_exact() {
        let ranked: Vec<usize> = (0..13).collect();
        let buckets = bucket_ranks(&ranked, 5);
        let quotas = allocate(&buckets, 10, 13);
        assert_eq!(quotas.iter().sum::<usize>(), 10);
        for (q, b) in quotas.iter().zip(&buckets) {
            assert!(*q <= b.len());
        }
    }
}
