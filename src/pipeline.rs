//! End-to-end run orchestration
//!
//! `Pipeline::run` performs every computation in memory and returns a
//! `PipelineOutcome`; nothing is written until `PipelineOutcome::write`.

use crate::data::{
    Cleaner, CleaningSummary, DataLoader, DescriptiveStats, Frame, LoadSummary,
    NormalizationParams, Normalizer, Split, Splitter, Table,
};
use crate::error::Result;
use crate::metrics::{EvaluationResult, Evaluator};
use crate::models::{LinearRegression, ModelArtifact, OlsModel, Predictor};
use crate::report::{FitStatistics, Report, ReportWriter, SplitSummary, WrittenArtifacts};
use crate::utils::{OutputConfig, PipelineConfig};
use chrono::Utc;
use tracing::{info, instrument};

/// Cleaned data and its statistics, before any modelling
#[derive(Debug, Clone)]
pub struct Description {
    pub load: LoadSummary,
    pub features: Vec<String>,
    pub cleaning: CleaningSummary,
    pub stats: DescriptiveStats,
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub load: LoadSummary,
    pub features: Vec<String>,
    pub cleaning: CleaningSummary,
    pub stats: DescriptiveStats,
    pub params: NormalizationParams,
    pub split: Split,
    pub model: OlsModel,
    pub evaluation: EvaluationResult,
    pub report: Report,
    pub artifact: ModelArtifact,
}

impl PipelineOutcome {
    /// Write the report, predictions, statistics and model
    pub fn write(&self, output: &OutputConfig) -> Result<WrittenArtifacts> {
        ReportWriter::new(output.clone()).write(
            &self.report,
            &self.evaluation,
            &self.stats,
            &self.artifact,
        )
    }

    /// Predictor backed by this run's model and normalization
    pub fn predictor(&self) -> Result<Predictor> {
        Predictor::new(&self.model, &self.params)
    }
}

/// Configured pipeline
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a pipeline from a validated configuration
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load, clean and summarize the configured input
    pub fn describe(&self) -> Result<Description> {
        let (table, load) = DataLoader::load_csv(&self.config.data.input)?;
        let (description, _) = self.prepare(&table, load)?;
        Ok(description)
    }

    /// Run every stage on the configured input
    #[instrument(skip(self), fields(input = %self.config.data.input.display()))]
    pub fn run(&self) -> Result<PipelineOutcome> {
        let (table, load) = DataLoader::load_csv(&self.config.data.input)?;
        self.run_table(&table, load)
    }

    /// Run every stage on an already loaded table
    pub fn run_table(&self, table: &Table, load: LoadSummary) -> Result<PipelineOutcome> {
        let (
            Description {
                load,
                features,
                cleaning,
                stats,
            },
            frame,
        ) = self.prepare(table, load)?;
        let target = self.config.data.target.clone();

        let (normalized, params) = Normalizer::fit_transform(&frame)?;
        info!("Normalized {} columns", params.len());

        let split_config = &self.config.split;
        let split = Splitter::new(split_config.train_fraction, split_config.seed, split_config.strata)?
            .split(&normalized, &target)?;

        let model = LinearRegression::new(target.clone(), features.clone()).fit_frame(&split.train)?;
        info!(
            r_squared = model.r_squared,
            adj_r_squared = model.adj_r_squared,
            "Fitted OLS model on {} rows",
            model.n_obs
        );

        let evaluation = Evaluator::evaluate(&model, &split.test, &params)?;
        info!(
            rmse = evaluation.metrics.rmse,
            mae = evaluation.metrics.mae,
            r2 = evaluation.metrics.r2,
            "Evaluated on {} test rows",
            evaluation.metrics.n_samples
        );

        let artifact = ModelArtifact::from_model(&model, &params);
        let report = Report {
            generated_at: Utc::now(),
            input: self.config.data.input.clone(),
            target,
            features: features.clone(),
            skipped_columns: load.skipped_columns.clone(),
            cleaning: cleaning.clone(),
            stats: stats.clone(),
            split: SplitSummary {
                train_rows: split.train_indices.len(),
                test_rows: split.test_indices.len(),
                train_fraction: split_config.train_fraction,
                seed: split_config.seed,
            },
            coefficients: model.coefficients.clone(),
            fit: FitStatistics::from(&model),
            metrics: evaluation.metrics.clone(),
            diagnostics: model.diagnostics.clone(),
        };

        Ok(PipelineOutcome {
            load,
            features,
            cleaning,
            stats,
            params,
            split,
            model,
            evaluation,
            report,
            artifact,
        })
    }

    /// Resolve features, clean every numeric column and summarize.
    ///
    /// Returns the cleaned frame restricted to the features and target.
    fn prepare(&self, table: &Table, load: LoadSummary) -> Result<(Description, Frame)> {
        let features = self.config.resolve_features(table.columns())?;
        info!("Target '{}' with features {:?}", self.config.data.target, features);

        let (cleaned, cleaning) =
            Cleaner::new(self.config.data.loss_warning_threshold).clean(table)?;
        let stats = DescriptiveStats::compute(&cleaned);
        let frame = cleaned.project(&modelled_columns(&features, &self.config.data.target))?;

        Ok((
            Description {
                load,
                features,
                cleaning,
                stats,
            },
            frame,
        ))
    }
}

/// Features followed by the target
fn modelled_columns(features: &[String], target: &str) -> Vec<String> {
    features
        .iter()
        .cloned()
        .chain(std::iter::once(target.to_string()))
        .collect()
}
