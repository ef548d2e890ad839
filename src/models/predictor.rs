//! Predictions on new records in original units
//!
//! Records are standardized with the training `NormalizationParams`,
//! scored by the linear model and mapped back with the target's scale.
//! Statistics are never recomputed from the incoming data.

use super::artifact::ModelArtifact;
use super::linear::OlsModel;
use crate::data::{ColumnScale, NormalizationParams};
use crate::error::{PipelineError, Result};
use std::collections::BTreeMap;

/// Feature values in original units, keyed by column name
pub type FeatureRecord = BTreeMap<String, f64>;

/// Applies a fitted model to raw feature records
#[derive(Debug, Clone)]
pub struct Predictor {
    features: Vec<String>,
    intercept: f64,
    slopes: Vec<f64>,
    feature_scales: Vec<ColumnScale>,
    target_scale: ColumnScale,
}

impl Predictor {
    /// Build from a fitted model and the params it was trained under
    pub fn new(model: &OlsModel, params: &NormalizationParams) -> Result<Self> {
        Self::from_parts(
            &model.target,
            &model.features,
            model.intercept(),
            model.slopes().to_vec(),
            params,
        )
    }

    /// Rebuild from a persisted artifact
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self> {
        let (intercept, slopes) = artifact.estimates()?;
        Self::from_parts(
            &artifact.target,
            &artifact.features,
            intercept,
            slopes,
            &artifact.normalization,
        )
    }

    fn from_parts(
        target: &str,
        features: &[String],
        intercept: f64,
        slopes: Vec<f64>,
        params: &NormalizationParams,
    ) -> Result<Self> {
        let feature_scales = features
            .iter()
            .map(|f| params.get(f).copied())
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            features: features.to_vec(),
            intercept,
            slopes,
            feature_scales,
            target_scale: *params.get(target)?,
        })
    }

    /// Features the predictor requires
    pub fn features(&self) -> &[String] {
        &self.features
    }

    /// Predict the target for one record
    pub fn predict(&self, record: &FeatureRecord) -> Result<f64> {
        self.validate(record)?;

        let normalized: f64 = self
            .features
            .iter()
            .zip(&self.feature_scales)
            .zip(&self.slopes)
            .map(|((name, scale), slope)| slope * scale.normalize(record[name]))
            .sum::<f64>()
            + self.intercept;

        Ok(self.target_scale.denormalize(normalized))
    }

    /// Predict many records; the first invalid record fails the batch
    pub fn predict_batch(&self, records: &[FeatureRecord]) -> Result<Vec<f64>> {
        records.iter().map(|r| self.predict(r)).collect()
    }

    /// Every model feature must be present and nothing else
    fn validate(&self, record: &FeatureRecord) -> Result<()> {
        if let Some(missing) = self.features.iter().find(|f| !record.contains_key(*f)) {
            return Err(PipelineError::MissingFeature(missing.clone()));
        }
        if let Some(extra) = record.keys().find(|k| !self.features.contains(*k)) {
            return Err(PipelineError::UnknownColumn(extra.clone()));
        }
        Ok(())
    }
}
