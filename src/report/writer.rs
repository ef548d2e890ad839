//! Artifact output

use super::summary::Report;
use crate::data::DescriptiveStats;
use crate::error::Result;
use crate::metrics::EvaluationResult;
use crate::models::ModelArtifact;
use crate::utils::OutputConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Paths of the files produced by a run
#[derive(Debug, Clone, PartialEq)]
pub struct WrittenArtifacts {
    pub report: PathBuf,
    pub predictions: PathBuf,
    pub stats: PathBuf,
    pub model: PathBuf,
}

/// Writes the report, predictions, statistics and model files
pub struct ReportWriter {
    output: OutputConfig,
}

impl ReportWriter {
    pub fn new(output: OutputConfig) -> Self {
        Self { output }
    }

    /// Write every artifact, creating the output directory if needed
    pub fn write(
        &self,
        report: &Report,
        evaluation: &EvaluationResult,
        stats: &DescriptiveStats,
        artifact: &ModelArtifact,
    ) -> Result<WrittenArtifacts> {
        fs::create_dir_all(&self.output.dir)?;

        let written = WrittenArtifacts {
            report: self.output.report_path(),
            predictions: self.output.predictions_path(),
            stats: self.output.stats_path(),
            model: self.output.model_path(),
        };

        fs::write(&written.report, report.render())?;
        debug!(path = %written.report.display(), "Wrote report");

        write_csv(&written.predictions, &evaluation.rows)?;
        debug!(
            path = %written.predictions.display(),
            rows = evaluation.rows.len(),
            "Wrote predictions"
        );

        write_csv(&written.stats, &stats.columns)?;
        debug!(path = %written.stats.display(), "Wrote descriptive statistics");

        artifact.save(&written.model)?;
        debug!(path = %written.model.display(), "Wrote model");

        info!(dir = %self.output.dir.display(), "Artifacts written");
        Ok(written)
    }
}

/// Serialize records to CSV with a header row
fn write_csv<T: serde::Serialize>(path: &Path, records: &[T]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for record in records {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}
