//! Persisted model
//!
//! Holds exactly what the predictor needs: target, ordered features,
//! coefficient estimates and the training normalization parameters.

use super::linear::{OlsModel, INTERCEPT};
use crate::data::NormalizationParams;
use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Named coefficient estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermEstimate {
    pub term: String,
    pub estimate: f64,
}

/// Serializable model sufficient to rebuild the predictor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub target: String,
    pub features: Vec<String>,
    /// Intercept first, then features in order (normalized scale)
    pub coefficients: Vec<TermEstimate>,
    pub normalization: NormalizationParams,
}

impl ModelArtifact {
    /// Capture a fitted model and its scaling parameters
    pub fn from_model(model: &OlsModel, normalization: &NormalizationParams) -> Self {
        Self {
            target: model.target.clone(),
            features: model.features.clone(),
            coefficients: model
                .coefficients
                .iter()
                .map(|c| TermEstimate {
                    term: c.term.clone(),
                    estimate: c.estimate,
                })
                .collect(),
            normalization: normalization.clone(),
        }
    }

    /// Intercept and feature slopes, checked against the feature list
    pub fn estimates(&self) -> Result<(f64, Vec<f64>)> {
        if self.coefficients.len() != self.features.len() + 1 {
            return Err(PipelineError::DimensionMismatch {
                expected: self.features.len() + 1,
                got: self.coefficients.len(),
            });
        }
        if self.coefficients[0].term != INTERCEPT {
            return Err(PipelineError::MissingColumn(INTERCEPT.to_string()));
        }
        for (coef, feature) in self.coefficients[1..].iter().zip(&self.features) {
            if &coef.term != feature {
                return Err(PipelineError::MissingColumn(feature.clone()));
            }
        }

        let slopes = self.coefficients[1..].iter().map(|c| c.estimate).collect();
        Ok((self.coefficients[0].estimate, slopes))
    }

    /// Save as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Load from JSON
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PipelineError::InputNotFound {
                path: path.to_path_buf(),
            },
            _ => PipelineError::Io(e),
        })?;
        let artifact: ModelArtifact = serde_json::from_reader(BufReader::new(file))?;
        artifact.estimates()?;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ColumnScale;
    use tempfile::tempdir;

    fn artifact() -> ModelArtifact {
        ModelArtifact {
            target: "close".to_string(),
            features: vec!["open".to_string()],
            coefficients: vec![
                TermEstimate {
                    term: INTERCEPT.to_string(),
                    estimate: 0.01,
                },
                TermEstimate {
                    term: "open".to_string(),
                    estimate: 0.95,
                },
            ],
            normalization: NormalizationParams::new(vec![
                (
                    "open".to_string(),
                    ColumnScale {
                        mean: 1.1,
                        std_dev: 0.05,
                    },
                ),
                (
                    "close".to_string(),
                    ColumnScale {
                        mean: 1.12,
                        std_dev: 0.04,
                    },
                ),
            ]),
        }
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");

        let original = artifact();
        original.save(&path).unwrap();
        let loaded = ModelArtifact::load(&path).unwrap();

        assert_eq!(loaded, original);
    }

    #[test]
    fn test_estimates_reject_mismatched_terms() {
        let mut broken = artifact();
        broken.coefficients[1].term = "high".to_string();
        assert!(broken.estimates().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            ModelArtifact::load(dir.path().join("absent.json")),
            Err(PipelineError::InputNotFound { .. })
        ));
    }
}
