//! Configuration handling.

use crate::data::cleaner::DEFAULT_LOSS_WARNING_THRESHOLD;
use crate::data::splitter::{DEFAULT_SEED, DEFAULT_STRATA, DEFAULT_TRAIN_FRACTION};
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Input data configuration
    pub data: DataConfig,
    /// Train/test split configuration
    pub split: SplitConfig,
    /// Output artifact configuration
    pub output: OutputConfig,
}

impl PipelineConfig {
    /// Load configuration from TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to TOML file.
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check option ranges and the feature list
    pub fn validate(&self) -> Result<()> {
        if self.data.target.trim().is_empty() {
            return Err(PipelineError::invalid_config("target column is empty"));
        }
        if !(self.split.train_fraction > 0.0 && self.split.train_fraction < 1.0) {
            return Err(PipelineError::invalid_config(format!(
                "train_fraction must be in (0, 1), got {}",
                self.split.train_fraction
            )));
        }
        if self.split.strata == 0 {
            return Err(PipelineError::invalid_config("strata must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.data.loss_warning_threshold) {
            return Err(PipelineError::invalid_config(format!(
                "loss_warning_threshold must be in [0, 1], got {}",
                self.data.loss_warning_threshold
            )));
        }

        if let Some(features) = &self.data.features {
            let mut seen = HashSet::new();
            for feature in features {
                if !seen.insert(feature) {
                    return Err(PipelineError::invalid_config(format!(
                        "feature '{}' listed more than once",
                        feature
                    )));
                }
                if feature == &self.data.target {
                    return Err(PipelineError::invalid_config(format!(
                        "target '{}' cannot also be a feature",
                        feature
                    )));
                }
            }
        }

        Ok(())
    }

    /// Derive the feature list against a table schema.
    ///
    /// Uses the explicit list when one is configured, otherwise every
    /// column except the target.
    pub fn resolve_features(&self, columns: &[String]) -> Result<Vec<String>> {
        if !columns.contains(&self.data.target) {
            return Err(PipelineError::MissingColumn(self.data.target.clone()));
        }

        let features = match &self.data.features {
            Some(explicit) => {
                if let Some(missing) = explicit.iter().find(|f| !columns.contains(*f)) {
                    return Err(PipelineError::MissingColumn(missing.clone()));
                }
                explicit.clone()
            }
            None => columns
                .iter()
                .filter(|c| **c != self.data.target)
                .cloned()
                .collect(),
        };

        if features.is_empty() {
            return Err(PipelineError::invalid_config(
                "no feature columns besides the target",
            ));
        }

        Ok(features)
    }
}

/// Input data configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path to the CSV input
    pub input: PathBuf,
    /// Column to predict
    pub target: String,
    /// Explicit feature columns; all other numeric columns when absent
    pub features: Option<Vec<String>>,
    /// Minimum share of rows that should survive cleaning
    pub loss_warning_threshold: f64,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("data/prices.csv"),
            target: "Close".to_string(),
            features: None,
            loss_warning_threshold: DEFAULT_LOSS_WARNING_THRESHOLD,
        }
    }
}

/// Train/test split configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Share of rows used for training
    pub train_fraction: f64,
    /// Seed for the split RNG
    pub seed: u64,
    /// Number of target quantile buckets
    pub strata: usize,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            train_fraction: DEFAULT_TRAIN_FRACTION,
            seed: DEFAULT_SEED,
            strata: DEFAULT_STRATA,
        }
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving all artifacts
    pub dir: PathBuf,
    pub report_file: String,
    pub predictions_file: String,
    pub stats_file: String,
    pub model_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            report_file: "report.txt".to_string(),
            predictions_file: "predictions.csv".to_string(),
            stats_file: "descriptive_stats.csv".to_string(),
            model_file: "model.json".to_string(),
        }
    }
}

impl OutputConfig {
    pub fn report_path(&self) -> PathBuf {
        self.dir.join(&self.report_file)
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.dir.join(&self.predictions_file)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.dir.join(&self.stats_file)
    }

    pub fn model_path(&self) -> PathBuf {
        self.dir.join(&self.model_file)
    }
}
