//! Closing price regression CLI
//!
//! Fits an OLS model to a CSV of market data, evaluates it on a held-out
//! split and writes a report with the persisted model.
//!
//! ```bash
//! price_regression run --input data/eurusd.csv --target Close
//! price_regression describe --input data/eurusd.csv
//! price_regression predict --model output/model.json --value Open=1.0841 --value High=1.0902
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use price_regression::models::{FeatureRecord, ModelArtifact, Predictor};
use price_regression::pipeline::Pipeline;
use price_regression::utils::PipelineConfig;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "price_regression")]
#[command(about = "Reproducible OLS regression for closing price prediction")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write all artifacts
    Run {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input CSV file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Target column
        #[arg(short, long)]
        target: Option<String>,

        /// Comma-separated feature columns (default: every other numeric column)
        #[arg(short, long, value_delimiter = ',')]
        features: Option<Vec<String>>,

        /// Share of rows used for training
        #[arg(long)]
        train_fraction: Option<f64>,

        /// Seed for the train/test split
        #[arg(long)]
        seed: Option<u64>,

        /// Number of target quantile buckets for stratification
        #[arg(long)]
        strata: Option<usize>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Load, clean and print descriptive statistics
    Describe {
        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Input CSV file
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Target column
        #[arg(short, long)]
        target: Option<String>,
    },

    /// Predict one record with a saved model
    Predict {
        /// Path to model.json
        #[arg(short, long, default_value = "output/model.json")]
        model: PathBuf,

        /// Feature value as NAME=VALUE (repeatable)
        #[arg(short, long = "value", required = true)]
        values: Vec<String>,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "price_regression=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            input,
            target,
            features,
            train_fraction,
            seed,
            strata,
            output_dir,
        } => {
            let mut config = load_config(config.as_deref())?;
            apply_data_overrides(&mut config, input, target);
            if let Some(features) = features {
                config.data.features = Some(features);
            }
            if let Some(train_fraction) = train_fraction {
                config.split.train_fraction = train_fraction;
            }
            if let Some(seed) = seed {
                config.split.seed = seed;
            }
            if let Some(strata) = strata {
                config.split.strata = strata;
            }
            if let Some(dir) = output_dir {
                config.output.dir = dir;
            }

            run(config)?;
        }

        Commands::Describe {
            config,
            input,
            target,
        } => {
            let mut config = load_config(config.as_deref())?;
            apply_data_overrides(&mut config, input, target);
            describe(config)?;
        }

        Commands::Predict { model, values } => {
            predict(&model, &values)?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn apply_data_overrides(config: &mut PipelineConfig, input: Option<PathBuf>, target: Option<String>) {
    if let Some(input) = input {
        config.data.input = input;
    }
    if let Some(target) = target {
        config.data.target = target;
    }
}

fn run(config: PipelineConfig) -> Result<()> {
    let output = config.output.clone();
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;

    let outcome = pipeline.run().context("Pipeline run failed")?;

    let written = outcome
        .write(&output)
        .with_context(|| format!("Failed to write artifacts to {}", output.dir.display()))?;

    println!("{}", outcome.model.summary());
    println!("\n=== Test Set Evaluation ===");
    println!("{}", outcome.evaluation.metrics.report());

    info!("Report:      {}", written.report.display());
    info!("Predictions: {}", written.predictions.display());
    info!("Statistics:  {}", written.stats.display());
    info!("Model:       {}", written.model.display());

    Ok(())
}

fn describe(config: PipelineConfig) -> Result<()> {
    let pipeline = Pipeline::new(config).context("Invalid configuration")?;
    let description = pipeline.describe().context("Failed to describe input")?;

    if !description.load.skipped_columns.is_empty() {
        println!(
            "Skipped non-numeric columns: {}",
            description.load.skipped_columns.join(", ")
        );
    }
    println!(
        "Rows: {} -> {} ({} with missing values, {} duplicates)",
        description.cleaning.original_rows,
        description.cleaning.final_rows,
        description.cleaning.removed_missing,
        description.cleaning.removed_duplicates
    );
    if let Some(warning) = &description.cleaning.warning {
        println!("WARNING: {}", warning);
    }
    println!();
    print!("{}", description.stats.to_table_string());

    Ok(())
}

fn predict(model_path: &Path, values: &[String]) -> Result<()> {
    let artifact = ModelArtifact::load(model_path)
        .with_context(|| format!("Failed to load model from {}", model_path.display()))?;
    let predictor = Predictor::from_artifact(&artifact).context("Invalid model artifact")?;

    let record = parse_record(values)?;
    let prediction = predictor.predict(&record).context("Prediction failed")?;

    println!("{} = {:.6}", artifact.target, prediction);
    Ok(())
}

/// Parse repeated NAME=VALUE arguments
fn parse_record(values: &[String]) -> Result<FeatureRecord> {
    let mut record = FeatureRecord::new();
    for pair in values {
        let Some((name, raw)) = pair.split_once('=') else {
            bail!("Expected NAME=VALUE, got '{}'", pair);
        };
        let value: f64 = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid number for '{}': '{}'", name, raw))?;
        if record.insert(name.trim().to_string(), value).is_some() {
            bail!("Feature '{}' given more than once", name.trim());
        }
    }
    Ok(record)
}
